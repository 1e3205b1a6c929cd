//! Inbound user payload and its per-intent validation.

use serde::{Deserialize, Serialize};
use validator::{ValidateEmail, ValidationError, ValidationErrors};

use crate::user::{NewUser, UserChanges};

/// What the payload is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Create,
    /// Update of the user addressed by this path id.
    Update(i32),
}

/// User as sent by clients on `POST /users` and `PUT /users/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub id: Option<i32>,
    /// `null` and a missing key are both blank.
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

impl UserRequest {
    /// Check every field rule that applies to `intent`.
    pub fn validate(&self, intent: Intent) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.first_name.as_deref().is_none_or(is_blank) {
            errors.add("firstName", error("blank", "First Name is required"));
        }

        match self.email.as_deref() {
            Some(email) if !is_blank(email) => {
                if !email.validate_email() {
                    errors.add("email", error("email", "Email address is invalid"));
                }
            },
            _ => errors.add("email", error("blank", "Email is required")),
        }

        match intent {
            Intent::Create => {
                if self.id.is_some() {
                    errors.add(
                        "id",
                        error("forbidden", "User id is assigned by the server"),
                    );
                }
                if self.password.as_deref().is_none_or(is_blank) {
                    errors.add("password", error("blank", "Password is required"));
                }
            },
            Intent::Update(path_id) => match self.id {
                None => errors.add("id", error("missing", "Missing user id")),
                Some(id) if id != path_id => errors.add(
                    "id",
                    error("mismatch", "User id does not match the requested resource"),
                ),
                Some(_) => (),
            },
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate as a creation and keep the fields to insert.
    pub fn into_new_user(self) -> Result<NewUser, ValidationErrors> {
        self.validate(Intent::Create)?;

        Ok(NewUser {
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name,
            email: self.email.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
        })
    }

    /// Validate as an update of `id` and keep the editable fields.
    pub fn into_changes(self, id: i32) -> Result<UserChanges, ValidationErrors> {
        self.validate(Intent::Update(id))?;

        Ok(UserChanges {
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name,
            email: self.email.unwrap_or_default(),
        })
    }
}
