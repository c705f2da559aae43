//! Issue documents and the listing projection.
//!
//! An issue owns its comments (and their replies) and is persisted as a
//! single document.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, comment::Comment};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueStatus {
  Open,
  Closed,
}

impl IssueStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Open => "Open",
      Self::Closed => "Closed",
    }
  }
}

impl fmt::Display for IssueStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for IssueStatus {
  type Err = Error;

  /// Exact, case-sensitive match against the enumerated set.
  fn from_str(s: &str) -> Result<Self> {
    match s {
      "Open" => Ok(Self::Open),
      "Closed" => Ok(Self::Closed),
      other => Err(Error::InvalidStatus(other.to_owned())),
    }
  }
}

// ─── Issue ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
  #[serde(rename = "_id")]
  pub issue_id:       Uuid,
  pub title:          String,
  /// Free text; the Low/Medium/High option set is a client concern.
  pub priority:       String,
  pub priority_level: String,
  pub description:    String,
  pub address:        String,
  #[serde(default)]
  pub images:         Vec<String>,
  /// Username of the reporter.
  pub username:       String,
  pub latitude:       Option<f64>,
  pub longitude:      Option<f64>,
  /// `None` only for legacy documents written without a status.
  #[serde(default)]
  pub status:         Option<IssueStatus>,
  #[serde(default)]
  pub created_at:     Option<DateTime<Utc>>,
  #[serde(default)]
  pub updated_at:     Option<DateTime<Utc>>,
  #[serde(default)]
  pub comments:       Vec<Comment>,
}

impl Issue {
  pub fn comment(&self, comment_id: Uuid) -> Option<&Comment> {
    self.comments.iter().find(|c| c.comment_id == comment_id)
  }

  pub fn comment_mut(&mut self, comment_id: Uuid) -> Option<&mut Comment> {
    self.comments.iter_mut().find(|c| c.comment_id == comment_id)
  }

  /// The row shown in issue listings.
  pub fn summary(&self) -> IssueSummary {
    IssueSummary {
      issue_id:    self.issue_id,
      title:       self.title.clone(),
      description: self.description.clone(),
      status:      self
        .status
        .map_or_else(|| self.priority.clone(), |s| s.as_str().to_owned()),
      location:    self.address.clone(),
      date:        self.created_at.map_or_else(
        || "N/A".to_owned(),
        |at| at.date_naive().format("%Y-%m-%d").to_string(),
      ),
      images:      self.images.clone(),
    }
  }
}

/// Listing projection of an [`Issue`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSummary {
  #[serde(rename = "_id")]
  pub issue_id:    Uuid,
  pub title:       String,
  pub description: String,
  /// The status, or the priority for legacy issues without one.
  pub status:      String,
  pub location:    String,
  /// `YYYY-MM-DD`, or `"N/A"` when the creation date is unknown.
  pub date:        String,
  pub images:      Vec<String>,
}

// ─── Drafts ──────────────────────────────────────────────────────────────────

/// Unvalidated issue submission, as received from a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDraft {
  pub title:          Option<String>,
  pub priority:       Option<String>,
  pub priority_level: Option<String>,
  pub description:    Option<String>,
  pub address:        Option<String>,
  #[serde(default)]
  pub images:         Vec<String>,
  pub username:       Option<String>,
  pub latitude:       Option<f64>,
  pub longitude:      Option<f64>,
  pub status:         Option<String>,
}

impl IssueDraft {
  /// Check required fields and the optional status, producing a [`NewIssue`].
  pub fn validate(self) -> Result<NewIssue> {
    fn required(field: Option<String>) -> Option<String> {
      field.filter(|v| !v.trim().is_empty())
    }

    let (
      Some(title),
      Some(priority),
      Some(priority_level),
      Some(description),
      Some(address),
      Some(username),
    ) = (
      required(self.title),
      required(self.priority),
      required(self.priority_level),
      required(self.description),
      required(self.address),
      required(self.username),
    )
    else {
      return Err(Error::Validation("Missing required fields".into()));
    };

    let status = match self.status.as_deref() {
      None | Some("") => IssueStatus::Open,
      Some(s) => s.parse()?,
    };

    Ok(NewIssue {
      title,
      priority,
      priority_level,
      description,
      address,
      images: self.images,
      username,
      latitude: self.latitude,
      longitude: self.longitude,
      status,
    })
  }
}

/// Input to [`crate::store::IssueStore::insert_issue`]. Identifier and
/// timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewIssue {
  pub title:          String,
  pub priority:       String,
  pub priority_level: String,
  pub description:    String,
  pub address:        String,
  pub images:         Vec<String>,
  pub username:       String,
  pub latitude:       Option<f64>,
  pub longitude:      Option<f64>,
  pub status:         IssueStatus,
}
