pub mod status;
pub mod users;

use axum::extract::{FromRequest, FromRequestParts};

use crate::ServerError;

/// JSON body whose rejection is a [`ServerError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct Body<T>(pub T);

/// Path parameters whose rejection is a [`ServerError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ServerError))]
pub struct Params<T>(pub T);
