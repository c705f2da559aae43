//! Error type for `civic-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] civic_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A whole-document save targeted an issue that is not stored.
  #[error("issue not found: {0}")]
  IssueNotFound(uuid::Uuid),

  #[error("identity not found: {0}")]
  IdentityNotFound(uuid::Uuid),

  #[error("email already registered: {0}")]
  EmailTaken(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for civic_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::EmailTaken(_) => Self::Conflict("User already exists".into()),
      other => Self::persistence(other),
    }
  }
}
