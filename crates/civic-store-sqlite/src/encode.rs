//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with fixed microsecond
//! precision so that lexical order matches chronological order. UUIDs are
//! stored as hyphenated lowercase strings. Issues and audit metadata are
//! stored as compact JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use civic_core::{
  audit::AuditLogEntry,
  identity::{Identity, Role},
  issue::Issue,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Round-trip through the column encoding so in-memory values match what a
/// later read returns.
pub fn now() -> Result<DateTime<Utc>> { decode_dt(&encode_dt(Utc::now())) }

// ─── Issue documents ─────────────────────────────────────────────────────────

pub fn encode_issue(issue: &Issue) -> Result<String> {
  Ok(serde_json::to_string(issue)?)
}

pub fn decode_issue(s: &str) -> Result<Issue> { Ok(serde_json::from_str(s)?) }

// ─── Meta ────────────────────────────────────────────────────────────────────

pub fn encode_meta(meta: &Map<String, Value>) -> Result<String> {
  Ok(serde_json::to_string(meta)?)
}

/// Anything other than a JSON object decodes as an empty map.
pub fn decode_meta(s: &str) -> Result<Map<String, Value>> {
  match serde_json::from_str(s)? {
    Value::Object(map) => Ok(map),
    _ => Ok(Map::new()),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const IDENTITY_COLUMNS: &str = "identity_id, email, password_hash, role, \
   name, username, location, citizen_id, avatar, resolved, total_issues, \
   created_at, updated_at";

/// Raw values read directly from an `identities` row.
pub struct RawIdentity {
  pub identity_id:   String,
  pub email:         String,
  pub password_hash: String,
  pub role:          String,
  pub name:          String,
  pub username:      String,
  pub location:      String,
  pub citizen_id:    String,
  pub avatar:        String,
  pub resolved:      u32,
  pub total_issues:  u32,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawIdentity {
  /// Column order must match [`IDENTITY_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      identity_id:   row.get(0)?,
      email:         row.get(1)?,
      password_hash: row.get(2)?,
      role:          row.get(3)?,
      name:          row.get(4)?,
      username:      row.get(5)?,
      location:      row.get(6)?,
      citizen_id:    row.get(7)?,
      avatar:        row.get(8)?,
      resolved:      row.get(9)?,
      total_issues:  row.get(10)?,
      created_at:    row.get(11)?,
      updated_at:    row.get(12)?,
    })
  }

  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      identity_id:   decode_uuid(&self.identity_id)?,
      email:         self.email,
      password_hash: self.password_hash,
      role:          self.role.parse::<Role>()?,
      name:          self.name,
      username:      self.username,
      location:      self.location,
      citizen_id:    self.citizen_id,
      avatar:        self.avatar,
      resolved:      self.resolved,
      total_issues:  self.total_issues,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

pub const AUDIT_COLUMNS: &str = "log_id, issue_id, issue_title, actor_id, \
   actor, action, details, meta, timestamp";

/// Raw values read directly from an `audit_logs` row.
pub struct RawAuditEntry {
  pub log_id:      String,
  pub issue_id:    Option<String>,
  pub issue_title: String,
  pub actor_id:    Option<String>,
  pub actor:       String,
  pub action:      String,
  pub details:     String,
  pub meta:        String,
  pub timestamp:   String,
}

impl RawAuditEntry {
  /// Column order must match [`AUDIT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      log_id:      row.get(0)?,
      issue_id:    row.get(1)?,
      issue_title: row.get(2)?,
      actor_id:    row.get(3)?,
      actor:       row.get(4)?,
      action:      row.get(5)?,
      details:     row.get(6)?,
      meta:        row.get(7)?,
      timestamp:   row.get(8)?,
    })
  }

  pub fn into_entry(self) -> Result<AuditLogEntry> {
    Ok(AuditLogEntry {
      log_id:      decode_uuid(&self.log_id)?,
      issue_id:    self.issue_id.as_deref().map(decode_uuid).transpose()?,
      issue_title: self.issue_title,
      actor_id:    self.actor_id.as_deref().map(decode_uuid).transpose()?,
      actor:       self.actor,
      action:      self.action,
      details:     self.details,
      meta:        decode_meta(&self.meta)?,
      timestamp:   decode_dt(&self.timestamp)?,
    })
  }
}
