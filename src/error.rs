//! Error handler for roster.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use sqlx::Error as SQLxError;
use thiserror::Error;
use validator::ValidationErrors;

use crate::crypto::CryptoError;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Json(#[from] JsonRejection),

    #[error(transparent)]
    Path(#[from] PathRejection),

    #[error("user.not.found")]
    UserNotFound { id: i32 },

    #[error("{0}")]
    Sql(#[from] SQLxError),

    #[error("password cannot be processed")]
    Crypto(#[from] CryptoError),

    #[error("background task failed")]
    Task(#[from] tokio::task::JoinError),
}

/// Body of every error response.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    pub message: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(skip)]
    code: u16,
}

impl ResponseError {
    /// Create a response with the given status code and its reason phrase.
    pub fn new(code: StatusCode) -> Self {
        Self {
            message: String::default(),
            status: code.canonical_reason().unwrap_or_default().to_owned(),
            errors: None,
            code: code.as_u16(),
        }
    }

    /// Update `message` field.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        let errors = parse_validation_errors(errors);
        self.message = errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join(", ");
        self.errors = Some(errors);
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(self) -> std::result::Result<Response, axum::http::Error> {
        match serde_json::to_string(&self) {
            Ok(body) => Response::builder()
                .status(self.code)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into()),
            Err(_) => Ok(internal_server_error()),
        }
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut errors: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| issue.code.to_string()),
            })
        })
        .collect();
    // `field_errors` comes from a hash map.
    errors.sort_by(|a, b| a.field.cmp(&b.field));
    errors
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = match &self {
            ServerError::Validation(errors) => {
                ResponseError::new(StatusCode::BAD_REQUEST).errors(errors)
            },

            ServerError::Json(rejection) => {
                ResponseError::new(rejection.status()).message(rejection.body_text())
            },

            ServerError::Path(rejection) => {
                ResponseError::new(StatusCode::BAD_REQUEST).message(rejection.body_text())
            },

            ServerError::UserNotFound { id } => {
                tracing::debug!(user_id = id, "user not found");
                ResponseError::new(StatusCode::NOT_FOUND).message(self.to_string())
            },

            ServerError::Sql(err) => {
                tracing::error!(error = %err, "database request failed");
                ResponseError::new(StatusCode::INTERNAL_SERVER_ERROR).message(err.to_string())
            },

            ServerError::Crypto(err) => {
                tracing::error!(error = %err, "server returned 500 status");
                ResponseError::new(StatusCode::INTERNAL_SERVER_ERROR).message(self.to_string())
            },

            ServerError::Task(err) => {
                tracing::error!(error = %err, "blocking task did not complete");
                ResponseError::new(StatusCode::INTERNAL_SERVER_ERROR).message(self.to_string())
            },
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "message": "Internal server error.",
                "status": "Internal Server Error",
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}
