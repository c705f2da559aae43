//! [`SqliteStore`]: the SQLite implementation of the civic store traits.

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use civic_core::{
  audit::{AuditLogEntry, NewAuditEntry},
  identity::{Identity, NewIdentity},
  issue::{Issue, NewIssue},
  store::{AuditStore, IdentityStore, IssueStore},
};

use crate::{
  Error, Result,
  encode::{
    AUDIT_COLUMNS, IDENTITY_COLUMNS, RawAuditEntry, RawIdentity, decode_issue,
    decode_uuid, encode_dt, encode_issue, encode_meta, encode_uuid, now,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A civic store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn email_owner(&self, email: String) -> Result<Option<Uuid>> {
    let owner: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT identity_id FROM identities WHERE email = ?1",
              rusqlite::params![email],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    owner.as_deref().map(decode_uuid).transpose()
  }
}

/// `email` is the only `UNIQUE` column on `identities` besides the random
/// primary key.
fn is_constraint_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

// ─── IssueStore impl ─────────────────────────────────────────────────────────

impl IssueStore for SqliteStore {
  type Error = Error;

  async fn insert_issue(&self, input: NewIssue) -> Result<Issue> {
    let at = now()?;
    let issue = Issue {
      issue_id:       Uuid::new_v4(),
      title:          input.title,
      priority:       input.priority,
      priority_level: input.priority_level,
      description:    input.description,
      address:        input.address,
      images:         input.images,
      username:       input.username,
      latitude:       input.latitude,
      longitude:      input.longitude,
      status:         Some(input.status),
      created_at:     Some(at),
      updated_at:     Some(at),
      comments:       Vec::new(),
    };

    let id_str   = encode_uuid(issue.issue_id);
    let at_str   = encode_dt(at);
    let document = encode_issue(&issue)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO issues (issue_id, created_at, updated_at, document)
           VALUES (?1, ?2, ?2, ?3)",
          rusqlite::params![id_str, at_str, document],
        )?;
        Ok(())
      })
      .await?;

    Ok(issue)
  }

  async fn get_issue(&self, id: Uuid) -> Result<Option<Issue>> {
    let id_str = encode_uuid(id);

    let document: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT document FROM issues WHERE issue_id = ?1",
              rusqlite::params![id_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    document.as_deref().map(decode_issue).transpose()
  }

  async fn list_issues(&self) -> Result<Vec<Issue>> {
    let documents: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT document FROM issues ORDER BY rowid")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    documents.iter().map(|d| decode_issue(d)).collect()
  }

  async fn save_issue(&self, mut issue: Issue) -> Result<Issue> {
    let at = now()?;
    issue.updated_at = Some(at);

    let issue_id = issue.issue_id;
    let id_str   = encode_uuid(issue_id);
    let at_str   = encode_dt(at);
    let document = encode_issue(&issue)?;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE issues SET document = ?2, updated_at = ?3 WHERE issue_id = ?1",
          rusqlite::params![id_str, document, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::IssueNotFound(issue_id));
    }
    Ok(issue)
  }
}

// ─── IdentityStore impl ──────────────────────────────────────────────────────

impl IdentityStore for SqliteStore {
  type Error = Error;

  async fn create_identity(&self, input: NewIdentity) -> Result<Identity> {
    if self.email_owner(input.email.clone()).await?.is_some() {
      return Err(Error::EmailTaken(input.email));
    }

    let at = now()?;
    let identity = Identity {
      identity_id:   Uuid::new_v4(),
      email:         input.email,
      password_hash: input.password_hash,
      role:          input.role,
      name:          input.name,
      username:      input.username,
      location:      String::new(),
      citizen_id:    String::new(),
      avatar:        String::new(),
      resolved:      0,
      total_issues:  0,
      created_at:    at,
      updated_at:    at,
    };

    let id_str   = encode_uuid(identity.identity_id);
    let email    = identity.email.clone();
    let hash     = identity.password_hash.clone();
    let role     = identity.role.as_str();
    let name     = identity.name.clone();
    let username = identity.username.clone();
    let at_str   = encode_dt(at);

    let inserted = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO identities (
             identity_id, email, password_hash, role, name, username,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          rusqlite::params![id_str, email, hash, role, name, username, at_str],
        ) {
          Ok(_) => Ok(true),
          Err(e) if is_constraint_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    // Another writer registered the email between the check and the insert.
    if !inserted {
      return Err(Error::EmailTaken(identity.email));
    }
    Ok(identity)
  }

  async fn get_identity(&self, id: Uuid) -> Result<Option<Identity>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {IDENTITY_COLUMNS} FROM identities WHERE identity_id = ?1"
              ),
              rusqlite::params![id_str],
              RawIdentity::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIdentity::into_identity).transpose()
  }

  async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>> {
    let email = email.trim().to_owned();

    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE email = ?1"),
              rusqlite::params![email],
              RawIdentity::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIdentity::into_identity).transpose()
  }

  async fn list_identities(&self) -> Result<Vec<Identity>> {
    let raws: Vec<RawIdentity> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {IDENTITY_COLUMNS} FROM identities ORDER BY created_at"
        ))?;
        let rows = stmt
          .query_map([], RawIdentity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIdentity::into_identity).collect()
  }

  async fn save_identity(&self, mut identity: Identity) -> Result<Identity> {
    if let Some(owner) = self.email_owner(identity.email.clone()).await?
      && owner != identity.identity_id
    {
      return Err(Error::EmailTaken(identity.email));
    }

    let at = now()?;
    identity.updated_at = at;

    let identity_id = identity.identity_id;
    let id_str      = encode_uuid(identity_id);
    let email       = identity.email.clone();
    let hash        = identity.password_hash.clone();
    let role        = identity.role.as_str();
    let name        = identity.name.clone();
    let username    = identity.username.clone();
    let location    = identity.location.clone();
    let citizen_id  = identity.citizen_id.clone();
    let avatar      = identity.avatar.clone();
    let resolved    = identity.resolved;
    let total       = identity.total_issues;
    let at_str      = encode_dt(at);

    let changed = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "UPDATE identities SET
             email = ?2, password_hash = ?3, role = ?4, name = ?5,
             username = ?6, location = ?7, citizen_id = ?8, avatar = ?9,
             resolved = ?10, total_issues = ?11, updated_at = ?12
           WHERE identity_id = ?1",
          rusqlite::params![
            id_str, email, hash, role, name, username, location, citizen_id,
            avatar, resolved, total, at_str,
          ],
        );
        match result {
          Ok(n) => Ok(Some(n)),
          Err(e) if is_constraint_violation(&e) => Ok(None),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match changed {
      None => return Err(Error::EmailTaken(identity.email)),
      Some(0) => return Err(Error::IdentityNotFound(identity_id)),
      Some(_) => {}
    }
    Ok(identity)
  }
}

// ─── AuditStore impl ─────────────────────────────────────────────────────────

impl AuditStore for SqliteStore {
  type Error = Error;

  async fn append_log(&self, input: NewAuditEntry) -> Result<AuditLogEntry> {
    let entry = AuditLogEntry {
      log_id:      Uuid::new_v4(),
      issue_id:    input.issue_id,
      issue_title: input.issue_title,
      actor_id:    input.actor_id,
      actor:       input.actor,
      action:      input.action,
      details:     input.details,
      meta:        input.meta,
      timestamp:   now()?,
    };

    let id_str       = encode_uuid(entry.log_id);
    let issue_id_str = entry.issue_id.map(encode_uuid);
    let title        = entry.issue_title.clone();
    let actor_id_str = entry.actor_id.map(encode_uuid);
    let actor        = entry.actor.clone();
    let action       = entry.action.clone();
    let details      = entry.details.clone();
    let meta_str     = encode_meta(&entry.meta)?;
    let at_str       = encode_dt(entry.timestamp);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO audit_logs (
             log_id, issue_id, issue_title, actor_id, actor,
             action, details, meta, timestamp
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            issue_id_str,
            title,
            actor_id_str,
            actor,
            action,
            details,
            meta_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(entry)
  }

  async fn recent_logs(&self, limit: usize) -> Result<Vec<AuditLogEntry>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawAuditEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {AUDIT_COLUMNS} FROM audit_logs
           ORDER BY timestamp DESC, rowid DESC
           LIMIT ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], RawAuditEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAuditEntry::into_entry).collect()
  }
}
