//! Error taxonomy shared by every layer above the store.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field is missing or empty.
  #[error("{0}")]
  Validation(String),

  /// An identifier that is not a well-formed document reference.
  #[error("invalid {0} id")]
  InvalidReference(&'static str),

  #[error("invalid status: {0:?}")]
  InvalidStatus(String),

  #[error("{0}")]
  PermissionDenied(String),

  #[error("{0} not found")]
  NotFound(&'static str),

  #[error("{0}")]
  Conflict(String),

  #[error("{0}")]
  Unauthorized(String),

  #[error("persistence failure: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a store error. The cause is kept for logging only.
  pub fn persistence<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
