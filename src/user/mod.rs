mod repository;
mod request;

#[cfg(test)]
pub(crate) mod memory;

pub use repository::*;
pub use request::*;

use serde::{Deserialize, Serialize};

/// Placeholder sent instead of any password.
pub const PASSWORD_MASK: &str = "XXXX";

/// User as saved on database.
#[derive(Clone, Debug, Default, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    /// Argon2id PHC string.
    pub password: String,
}

impl User {
    /// Turn the row into its public form, replacing the password with
    /// [`PASSWORD_MASK`].
    pub fn mask_password(self) -> UserResponse {
        UserResponse {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password: PASSWORD_MASK.to_owned(),
        }
    }

    /// Overwrite the editable fields, keeping `id` and `password`.
    pub fn apply(mut self, changes: UserChanges) -> Self {
        self.first_name = changes.first_name;
        self.last_name = changes.last_name;
        self.email = changes.email;
        self
    }
}

/// User leaving the service.
///
/// Only built by [`User::mask_password`], so `password` is always the mask.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    password: String,
}

impl UserResponse {
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        user.mask_password()
    }
}

/// Mask every user of a collection.
pub fn mask_all(users: Vec<User>) -> Vec<UserResponse> {
    users.into_iter().map(User::mask_password).collect()
}

/// User to insert, without id.
#[derive(Clone, Debug, PartialEq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub password: String,
}

impl NewUser {
    /// Replace the plain password with its Argon2id hash.
    pub fn hash_password(
        mut self,
        pwd: &crate::crypto::PasswordManager,
    ) -> Result<Self, crate::crypto::CryptoError> {
        self.password = pwd.hash_password(&self.password)?;
        Ok(self)
    }
}

/// Fields an update is allowed to overwrite.
#[derive(Clone, Debug, PartialEq)]
pub struct UserChanges {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
}
