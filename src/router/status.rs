//! Public server status.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::config::Configuration;

/// Instance name and version.
pub async fn status(
    State(config): State<Arc<Configuration>>,
) -> Json<Configuration> {
    Json(config.as_ref().clone())
}
