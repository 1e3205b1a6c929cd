//! Handle database requests.

use async_trait::async_trait;
use sqlx::{PgConnection, Pool, Postgres};

use crate::error::{Result, ServerError};
use crate::user::{NewUser, User, UserChanges};

const GET_ALL: &str =
    "SELECT id, first_name, last_name, email, password FROM users ORDER BY id";
const GET_ONE_BY_ID: &str =
    "SELECT id, first_name, last_name, email, password FROM users WHERE id = $1 LIMIT 1";
const LOCK_ONE_BY_ID: &str =
    "SELECT id, first_name, last_name, email, password FROM users WHERE id = $1 LIMIT 1 FOR UPDATE";
const INSERT_ONE: &str = r#"INSERT INTO users (first_name, last_name, email, password)
    VALUES ($1, $2, $3, $4)
    RETURNING id, first_name, last_name, email, password"#;
const UPDATE_ONE: &str =
    "UPDATE users SET email = $1, first_name = $2, last_name = $3 WHERE id = $4";
const DELETE_ONE: &str = "DELETE FROM users WHERE id = $1";

/// Persistence of [`User`] rows.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Every user, ordered by id.
    async fn get_all(&self) -> Result<Vec<User>>;

    /// User with this id.
    async fn get_one(&self, id: i32) -> Result<User>;

    /// Insert a user and return it with its assigned id.
    async fn create(&self, user: &NewUser) -> Result<User>;

    /// Overwrite `first_name`, `last_name` and `email` of an existing user.
    async fn update(&self, id: i32, changes: UserChanges) -> Result<User>;

    /// Remove an existing user.
    async fn delete(&self, id: i32) -> Result<()>;
}

/// PostgreSQL user repository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    /// Create a new [`PgUserRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Lock the row for the rest of the transaction.
async fn lock_by_id(conn: &mut PgConnection, id: i32) -> Result<User> {
    sqlx::query_as::<_, User>(LOCK_ONE_BY_ID)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or(ServerError::UserNotFound { id })
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_all(&self) -> Result<Vec<User>> {
        Ok(sqlx::query_as::<_, User>(GET_ALL)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_one(&self, id: i32) -> Result<User> {
        sqlx::query_as::<_, User>(GET_ONE_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServerError::UserNotFound { id })
    }

    async fn create(&self, user: &NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(INSERT_ONE)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.password)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(user_id = user.id, "user created");
        Ok(user)
    }

    async fn update(&self, id: i32, changes: UserChanges) -> Result<User> {
        // Dropping `tx` before commit rolls back.
        let mut tx = self.pool.begin().await?;

        let user = lock_by_id(&mut tx, id).await?.apply(changes);

        sqlx::query(UPDATE_ONE)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let user = sqlx::query_as::<_, User>(GET_ONE_BY_ID)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(user_id = id, "user updated");
        Ok(user)
    }

    async fn delete(&self, id: i32) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        lock_by_id(&mut tx, id).await?;

        sqlx::query(DELETE_ONE).bind(id).execute(&mut *tx).await?;

        tx.commit().await?;

        tracing::info!(user_id = id, "user deleted");
        Ok(())
    }
}
