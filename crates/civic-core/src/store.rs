//! Store traits and reference parsing.
//!
//! The traits are implemented by storage backends (e.g.
//! `civic-store-sqlite`). Higher layers depend on these abstractions, not on
//! any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Error, Result,
  audit::{AuditLogEntry, NewAuditEntry},
  identity::{Identity, NewIdentity},
  issue::{Issue, NewIssue},
};

/// Check that `raw` is a well-formed document identifier, independent of
/// whether anything with that id exists. `kind` names the referenced
/// document in the error.
pub fn parse_reference(kind: &'static str, raw: &str) -> Result<Uuid> {
  Uuid::parse_str(raw.trim()).map_err(|_| Error::InvalidReference(kind))
}

// ─── Issues ──────────────────────────────────────────────────────────────────

/// Whole-document persistence for issues.
///
/// Comments and replies live inside the issue document; there is no finer
/// unit of persistence. Concurrent writers to one issue are last-write-wins.
pub trait IssueStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new issue; the store assigns the id and both timestamps.
  fn insert_issue(
    &self,
    input: NewIssue,
  ) -> impl Future<Output = Result<Issue, Self::Error>> + Send + '_;

  /// Retrieve an issue by id. Returns `None` if not found.
  fn get_issue(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Issue>, Self::Error>> + Send + '_;

  /// All issues, in no particular order.
  fn list_issues(
    &self,
  ) -> impl Future<Output = Result<Vec<Issue>, Self::Error>> + Send + '_;

  /// Replace the stored document with `issue`, refreshing `updated_at`.
  fn save_issue(
    &self,
    issue: Issue,
  ) -> impl Future<Output = Result<Issue, Self::Error>> + Send + '_;
}

// ─── Identities ──────────────────────────────────────────────────────────────

/// Account persistence.
///
/// Store errors convert into [`Error`]; a duplicate email must become
/// [`Error::Conflict`], everything else [`Error::Persistence`].
pub trait IdentityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<Error>;

  /// Persist a new identity. Fails if the email is already registered.
  fn create_identity(
    &self,
    input: NewIdentity,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  fn get_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  fn find_identity_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;

  fn list_identities(
    &self,
  ) -> impl Future<Output = Result<Vec<Identity>, Self::Error>> + Send + '_;

  /// Replace the stored identity, refreshing `updated_at`.
  fn save_identity(
    &self,
    identity: Identity,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;
}

// ─── Audit log ───────────────────────────────────────────────────────────────

/// Append-only audit log storage.
pub trait AuditStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Append an entry; the store assigns the id and timestamp.
  fn append_log(
    &self,
    input: NewAuditEntry,
  ) -> impl Future<Output = Result<AuditLogEntry, Self::Error>> + Send + '_;

  /// The `limit` most recent entries, newest first.
  fn recent_logs(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<AuditLogEntry>, Self::Error>> + Send + '_;
}
