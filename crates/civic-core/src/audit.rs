//! Append-only audit log entries and their display resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::identity::Identity;

pub const ACTION_CREATED: &str = "Created";
pub const ACTION_STATUS_UPDATE: &str = "Status Update";

pub const DEFAULT_LOG_LIMIT: usize = 50;
pub const MAX_LOG_LIMIT: usize = 200;

pub const UNTITLED_ISSUE: &str = "Untitled Issue";
pub const UNKNOWN_ACTOR: &str = "Unknown";

/// A stored audit record. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
  #[serde(rename = "_id")]
  pub log_id:      Uuid,
  /// May point at an issue that no longer exists.
  pub issue_id:    Option<Uuid>,
  /// Title at the time of the event; empty when not captured.
  pub issue_title: String,
  pub actor_id:    Option<Uuid>,
  /// Actor display string at the time of the event; may be empty.
  pub actor:       String,
  pub action:      String,
  pub details:     String,
  pub meta:        Map<String, Value>,
  pub timestamp:   DateTime<Utc>,
}

/// Input to [`crate::store::AuditStore::append_log`]. Identifier and
/// timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
  pub issue_id:    Option<Uuid>,
  pub issue_title: String,
  pub actor_id:    Option<Uuid>,
  pub actor:       String,
  pub action:      String,
  pub details:     String,
  pub meta:        Map<String, Value>,
}

/// An audit entry with display-ready issue title and actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogView {
  #[serde(rename = "_id")]
  pub log_id:      Uuid,
  pub issue_id:    Option<Uuid>,
  pub issue_title: String,
  pub actor:       String,
  pub actor_id:    Option<Uuid>,
  pub action:      String,
  pub details:     String,
  pub meta:        Map<String, Value>,
  pub timestamp:   DateTime<Utc>,
}

impl AuditLogView {
  pub fn new(
    entry: AuditLogEntry,
    issue_title: String,
    actor: String,
  ) -> Self {
    Self {
      log_id: entry.log_id,
      issue_id: entry.issue_id,
      issue_title,
      actor,
      actor_id: entry.actor_id,
      action: entry.action,
      details: entry.details,
      meta: entry.meta,
      timestamp: entry.timestamp,
    }
  }
}

/// Default 50, hard cap 200. Zero is treated as "not supplied".
pub fn clamp_limit(requested: Option<usize>) -> usize {
  match requested {
    None | Some(0) => DEFAULT_LOG_LIMIT,
    Some(n) => n.min(MAX_LOG_LIMIT),
  }
}

/// Stored snapshot, then the live title, then [`UNTITLED_ISSUE`].
pub fn resolve_issue_title(snapshot: &str, live: Option<&str>) -> String {
  [Some(snapshot), live]
    .into_iter()
    .flatten()
    .find(|t| !t.is_empty())
    .unwrap_or(UNTITLED_ISSUE)
    .to_owned()
}

/// Stored snapshot, then the referenced identity's username, name or email,
/// then [`UNKNOWN_ACTOR`].
pub fn resolve_actor(snapshot: &str, identity: Option<&Identity>) -> String {
  if !snapshot.is_empty() {
    return snapshot.to_owned();
  }
  identity
    .and_then(|i| {
      [&i.username, &i.name, &i.email]
        .into_iter()
        .find(|s| !s.is_empty())
    })
    .map_or_else(|| UNKNOWN_ACTOR.to_owned(), Clone::clone)
}
