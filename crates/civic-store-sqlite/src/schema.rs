//! SQL schema for the civic SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS identities (
    identity_id   TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,         -- argon2 PHC string
    role          TEXT NOT NULL DEFAULT 'user',
    name          TEXT NOT NULL DEFAULT '',
    username      TEXT NOT NULL DEFAULT '',
    location      TEXT NOT NULL DEFAULT '',
    citizen_id    TEXT NOT NULL DEFAULT '',
    avatar        TEXT NOT NULL DEFAULT '',
    resolved      INTEGER NOT NULL DEFAULT 0,
    total_issues  INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- One row per issue. `document` holds the full JSON issue, comments and
-- replies included, and is always replaced as a whole.
CREATE TABLE IF NOT EXISTS issues (
    issue_id   TEXT PRIMARY KEY,
    created_at TEXT,
    updated_at TEXT,
    document   TEXT NOT NULL
);

-- Append-only. `issue_id` and `actor_id` are not foreign keys;
-- entries outlive the documents they mention.
CREATE TABLE IF NOT EXISTS audit_logs (
    log_id      TEXT PRIMARY KEY,
    issue_id    TEXT,
    issue_title TEXT NOT NULL DEFAULT '',
    actor_id    TEXT,
    actor       TEXT NOT NULL DEFAULT '',
    action      TEXT NOT NULL,
    details     TEXT NOT NULL DEFAULT '',
    meta        TEXT NOT NULL DEFAULT '{}',
    timestamp   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS audit_logs_timestamp_idx ON audit_logs(timestamp DESC);
CREATE INDEX IF NOT EXISTS audit_logs_issue_idx     ON audit_logs(issue_id);

PRAGMA user_version = 1;
";
