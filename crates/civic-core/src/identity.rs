//! Identity records, roles and the authenticated actor.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── Roles ───────────────────────────────────────────────────────────────────

/// Something an identity may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
  /// Move an issue between `Open` and `Closed`.
  ChangeIssueStatus,
  /// See every registered identity.
  ListIdentities,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[default]
  User,
  Admin,
  Volunteer,
}

impl Role {
  pub fn capabilities(self) -> &'static [Capability] {
    match self {
      Self::User => &[],
      Self::Volunteer => &[Capability::ChangeIssueStatus],
      Self::Admin => {
        &[Capability::ChangeIssueStatus, Capability::ListIdentities]
      }
    }
  }

  pub fn can(self, capability: Capability) -> bool {
    self.capabilities().contains(&capability)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::User => "user",
      Self::Admin => "admin",
      Self::Volunteer => "volunteer",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "user" => Ok(Self::User),
      "admin" => Ok(Self::Admin),
      "volunteer" => Ok(Self::Volunteer),
      other => Err(Error::Validation(format!("unknown role: {other:?}"))),
    }
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// A stored account. The password is only ever held as a PHC hash string.
#[derive(Debug, Clone)]
pub struct Identity {
  pub identity_id:   Uuid,
  pub email:         String,
  pub password_hash: String,
  pub role:          Role,
  pub name:          String,
  pub username:      String,
  pub location:      String,
  pub citizen_id:    String,
  /// Image URL or base64-encoded image.
  pub avatar:        String,
  pub resolved:      u32,
  pub total_issues:  u32,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

/// Input to [`crate::store::IdentityStore::create_identity`].
#[derive(Debug, Clone)]
pub struct NewIdentity {
  pub email:         String,
  pub password_hash: String,
  pub role:          Role,
  pub name:          String,
  pub username:      String,
}

/// Self-service profile edits. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
  pub email:         Option<String>,
  pub password_hash: Option<String>,
  pub name:          Option<String>,
  pub username:      Option<String>,
  pub location:      Option<String>,
  pub citizen_id:    Option<String>,
  pub avatar:        Option<String>,
}

impl ProfileUpdate {
  pub fn apply(self, identity: &mut Identity) {
    let Self {
      email,
      password_hash,
      name,
      username,
      location,
      citizen_id,
      avatar,
    } = self;

    // Empty strings count as "not supplied" for email and password.
    if let Some(email) = email.filter(|e| !e.trim().is_empty()) {
      identity.email = email.trim().to_owned();
    }
    if let Some(hash) = password_hash.filter(|h| !h.is_empty()) {
      identity.password_hash = hash;
    }
    if let Some(name) = name {
      identity.name = name;
    }
    if let Some(username) = username {
      identity.username = username;
    }
    if let Some(location) = location {
      identity.location = location;
    }
    if let Some(citizen_id) = citizen_id {
      identity.citizen_id = citizen_id;
    }
    if let Some(avatar) = avatar {
      identity.avatar = avatar;
    }
  }
}

/// The public projection of an identity; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  #[serde(rename = "_id")]
  pub identity_id:  Uuid,
  pub email:        String,
  pub role:         Role,
  pub name:         String,
  pub username:     String,
  pub location:     String,
  pub citizen_id:   String,
  pub avatar:       String,
  pub resolved:     u32,
  pub total_issues: u32,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl From<&Identity> for Profile {
  fn from(i: &Identity) -> Self {
    Self {
      identity_id:  i.identity_id,
      email:        i.email.clone(),
      role:         i.role,
      name:         i.name.clone(),
      username:     i.username.clone(),
      location:     i.location.clone(),
      citizen_id:   i.citizen_id.clone(),
      avatar:       i.avatar.clone(),
      resolved:     i.resolved,
      total_issues: i.total_issues,
      created_at:   i.created_at,
      updated_at:   i.updated_at,
    }
  }
}

// ─── Actor ───────────────────────────────────────────────────────────────────

/// The resolved identity behind an authenticated request.
///
/// Comments, replies and audit entries copy `username`/`avatar` from here at
/// write time; later profile edits do not rewrite them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
  pub identity_id: Uuid,
  pub email:       String,
  pub username:    String,
  pub name:        String,
  pub avatar:      String,
  pub role:        Role,
}

impl Actor {
  /// Username, then name, then email; the first that is non-empty.
  pub fn display_name(&self) -> &str {
    [&self.username, &self.name, &self.email]
      .into_iter()
      .find(|s| !s.is_empty())
      .map_or("Unknown", String::as_str)
  }

  pub fn can(&self, capability: Capability) -> bool {
    self.role.can(capability)
  }
}

impl From<&Identity> for Actor {
  fn from(i: &Identity) -> Self {
    Self {
      identity_id: i.identity_id,
      email:       i.email.clone(),
      username:    i.username.clone(),
      name:        i.name.clone(),
      avatar:      i.avatar.clone(),
      role:        i.role,
    }
  }
}
