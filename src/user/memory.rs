//! In-memory [`UserRepository`] for handler tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{Result, ServerError};
use crate::user::{NewUser, User, UserChanges, UserRepository};

#[derive(Default)]
pub struct MemoryRepository {
    rows: Mutex<BTreeMap<i32, User>>,
    /// Last id handed out, never reused like an identity column.
    last_id: AtomicI32,
    /// Number of `create` calls.
    pub creates: AtomicUsize,
}

impl MemoryRepository {
    /// Same rows as `fixtures/users.sql`.
    pub fn seeded() -> Self {
        let rows = [(1, "a", "b", "c@x.com", "d"),
            (2, "aa", "bb", "cc@x.com", "dd"),
            (3, "aaa", "bbb", "ccc@x.com", "ddd"),
            (4, "aaaa", "bbbb", "cccc@x.com", "dddd")]
        .into_iter()
        .map(|(id, first_name, last_name, email, password)| {
            (
                id,
                User {
                    id,
                    first_name: first_name.into(),
                    last_name: Some(last_name.into()),
                    email: email.into(),
                    password: password.into(),
                },
            )
        })
        .collect();

        Self {
            rows: Mutex::new(rows),
            last_id: AtomicI32::new(4),
            creates: AtomicUsize::new(0),
        }
    }

    /// Stored row, password included.
    pub fn row(&self, id: i32) -> Option<User> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn get_all(&self) -> Result<Vec<User>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn get_one(&self, id: i32) -> Result<User> {
        self.row(id).ok_or(ServerError::UserNotFound { id })
    }

    async fn create(&self, user: &NewUser) -> Result<User> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut rows = self.rows.lock().unwrap();
        let user = User {
            id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            password: user.password.clone(),
        };
        rows.insert(id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: i32, changes: UserChanges) -> Result<User> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows
            .get(&id)
            .cloned()
            .ok_or(ServerError::UserNotFound { id })?
            .apply(changes);
        rows.insert(id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: i32) -> Result<()> {
        self.rows
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(ServerError::UserNotFound { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user() -> NewUser {
        NewUser {
            first_name: "e".into(),
            last_name: None,
            email: "e@x.com".into(),
            password: "ee".into(),
        }
    }

    #[tokio::test]
    async fn test_ids_are_not_reused() {
        let repo = MemoryRepository::seeded();

        repo.delete(4).await.unwrap();
        assert_eq!(repo.create(&new_user()).await.unwrap().id, 5);

        repo.delete(5).await.unwrap();
        assert_eq!(repo.create(&new_user()).await.unwrap().id, 6);
        assert_eq!(repo.len(), 4);
    }

    #[tokio::test]
    async fn test_empty() {
        let repo = MemoryRepository::default();
        assert!(repo.is_empty());

        assert_eq!(repo.create(&new_user()).await.unwrap().id, 1);
        assert!(!repo.is_empty());
    }
}
