//! Users-related HTTP API.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;

use crate::error::Result;
use crate::router::{Body, Params};
use crate::user::{UserRequest, UserResponse, mask_all};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // `GET /users` and `POST /users`.
        .route("/", get(get_all).post(create))
        // `GET`, `PUT` and `DELETE /users/{id}`.
        .route("/{id}", get(get_one).put(update).delete(delete))
}

/// List every user.
pub async fn get_all(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>> {
    let users = state.users.get_all().await?;
    Ok(Json(mask_all(users)))
}

/// Create a user and answer with the refreshed list.
pub async fn create(
    State(state): State<AppState>,
    Body(body): Body<UserRequest>,
) -> Result<(StatusCode, Json<Vec<UserResponse>>)> {
    let user = body.into_new_user()?;

    // Argon2 is CPU-bound, keep it off the async workers.
    let crypto = Arc::clone(&state.crypto);
    let user = tokio::task::spawn_blocking(move || user.hash_password(&crypto)).await??;

    state.users.create(&user).await?;
    let users = state.users.get_all().await?;

    Ok((StatusCode::CREATED, Json(mask_all(users))))
}

/// Get one user.
pub async fn get_one(
    State(state): State<AppState>,
    Params(id): Params<i32>,
) -> Result<Json<UserResponse>> {
    let user = state.users.get_one(id).await?;
    Ok(Json(user.mask_password()))
}

/// Overwrite names and email of a user.
pub async fn update(
    State(state): State<AppState>,
    Params(id): Params<i32>,
    Body(body): Body<UserRequest>,
) -> Result<Json<UserResponse>> {
    let changes = body.into_changes(id)?;

    let user = state.users.update(id, changes).await?;
    Ok(Json(user.mask_password()))
}

/// Delete a user.
pub async fn delete(
    State(state): State<AppState>,
    Params(id): Params<i32>,
) -> Result<StatusCode> {
    state.users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
