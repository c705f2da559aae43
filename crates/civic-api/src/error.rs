//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use civic_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),

  /// argon2 could not produce a hash for a new password.
  #[error("password hashing failed: {0}")]
  PasswordHash(String),
}

/// An unreadable request body is a validation failure.
impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::Core(CoreError::Validation(rejection.body_text()))
  }
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Core(e) => match e {
        CoreError::Validation(_)
        | CoreError::InvalidReference(_)
        | CoreError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
        CoreError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::Conflict(_) => StatusCode::CONFLICT,
        CoreError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        CoreError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
      ApiError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();

    let message = if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
      "Server error".to_owned()
    } else {
      self.to_string()
    };

    let mut res = (status, Json(json!({ "message": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"civic\""),
      );
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kinds_map_to_status_codes() {
    let cases = [
      (CoreError::Validation("x".into()), StatusCode::BAD_REQUEST),
      (CoreError::InvalidReference("issue"), StatusCode::BAD_REQUEST),
      (CoreError::InvalidStatus("Done".into()), StatusCode::BAD_REQUEST),
      (CoreError::PermissionDenied("x".into()), StatusCode::FORBIDDEN),
      (CoreError::NotFound("issue"), StatusCode::NOT_FOUND),
      (CoreError::Conflict("x".into()), StatusCode::CONFLICT),
      (CoreError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
    ];
    for (err, expected) in cases {
      assert_eq!(ApiError::from(err).status(), expected);
    }
  }

  #[test]
  fn unauthorized_carries_challenge() {
    let res = ApiError::from(CoreError::Unauthorized("no".into())).into_response();
    assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[test]
  fn persistence_detail_is_hidden() {
    let err = CoreError::persistence(std::io::Error::other("disk on fire"));
    let res = ApiError::from(err).into_response();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
