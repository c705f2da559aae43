//! Request body extraction with [`ApiError`] rejections.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json`, except that a missing, malformed or mistyped body is
/// rejected as a 400 with the usual `{message}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
