//! Comments and replies embedded in an issue document.
//!
//! A comment keeps two vote sets. An identity is in at most one of them, and
//! the like/dislike counts always equal the set sizes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::Actor;

/// What a vote toggle did to the target set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
  Added,
  Removed,
}

// ─── Reply ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
  #[serde(rename = "_id")]
  pub reply_id:   Uuid,
  /// Author identity reference.
  pub user:       Uuid,
  pub username:   String,
  #[serde(default)]
  pub avatar:     String,
  pub text:       String,
  pub created_at: DateTime<Utc>,
}

impl Reply {
  /// `text` is expected to be trimmed and non-empty already.
  pub fn new(author: &Actor, text: String) -> Self {
    Self {
      reply_id:   Uuid::new_v4(),
      user:       author.identity_id,
      username:   author.display_name().to_owned(),
      avatar:     author.avatar.clone(),
      text,
      created_at: Utc::now(),
    }
  }
}

// ─── Comment ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  #[serde(rename = "_id")]
  pub comment_id: Uuid,
  /// Author identity reference.
  pub user:       Uuid,
  pub username:   String,
  #[serde(default)]
  pub avatar:     String,
  pub text:       String,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  liked_by:       Vec<Uuid>,
  #[serde(default)]
  disliked_by:    Vec<Uuid>,
  #[serde(default)]
  likes:          usize,
  #[serde(default)]
  dislikes:       usize,
  #[serde(default)]
  pub replies:    Vec<Reply>,
}

impl Comment {
  /// `text` is expected to be trimmed and non-empty already.
  pub fn new(author: &Actor, text: String) -> Self {
    Self {
      comment_id:  Uuid::new_v4(),
      user:        author.identity_id,
      username:    author.display_name().to_owned(),
      avatar:      author.avatar.clone(),
      text,
      created_at:  Utc::now(),
      liked_by:    Vec::new(),
      disliked_by: Vec::new(),
      likes:       0,
      dislikes:    0,
      replies:     Vec::new(),
    }
  }

  pub fn liked_by(&self) -> &[Uuid] { &self.liked_by }

  pub fn disliked_by(&self) -> &[Uuid] { &self.disliked_by }

  pub fn likes(&self) -> usize { self.liked_by.len() }

  pub fn dislikes(&self) -> usize { self.disliked_by.len() }

  /// Toggle a like by `who`. Liking clears any dislike by the same identity.
  pub fn toggle_like(&mut self, who: Uuid) -> VoteOutcome {
    let outcome = if let Some(pos) = self.liked_by.iter().position(|u| *u == who) {
      self.liked_by.remove(pos);
      VoteOutcome::Removed
    } else {
      self.liked_by.push(who);
      self.disliked_by.retain(|u| *u != who);
      VoteOutcome::Added
    };
    self.recount();
    outcome
  }

  /// Toggle a dislike by `who`. Disliking clears any like by the same
  /// identity.
  pub fn toggle_dislike(&mut self, who: Uuid) -> VoteOutcome {
    let outcome =
      if let Some(pos) = self.disliked_by.iter().position(|u| *u == who) {
        self.disliked_by.remove(pos);
        VoteOutcome::Removed
      } else {
        self.disliked_by.push(who);
        self.liked_by.retain(|u| *u != who);
        VoteOutcome::Added
      };
    self.recount();
    outcome
  }

  pub fn add_reply(&mut self, reply: Reply) { self.replies.push(reply); }

  fn recount(&mut self) {
    self.likes = self.liked_by.len();
    self.dislikes = self.disliked_by.len();
  }
}
