//! [`IssueService`]: issue creation, status transitions, comments, votes,
//! replies and audit log retrieval.
//!
//! Every mutation loads the whole issue, changes it in memory and saves the
//! whole document back. Validation and reference checks run before anything
//! is written. Audit entries are written on a detached task; their failures
//! are logged and never reach the caller.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::{
  Error, Result,
  audit::{
    ACTION_CREATED, ACTION_STATUS_UPDATE, AuditLogView, NewAuditEntry,
    clamp_limit, resolve_actor, resolve_issue_title,
  },
  comment::{Comment, Reply},
  identity::{Actor, Capability},
  issue::{Issue, IssueDraft, IssueStatus, IssueSummary},
  store::{AuditStore, IdentityStore, IssueStore, parse_reference},
};

pub struct IssueService<S, A> {
  store: Arc<S>,
  audit: Arc<A>,
}

impl<S, A> Clone for IssueService<S, A> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      audit: Arc::clone(&self.audit),
    }
  }
}

impl<S, A> IssueService<S, A>
where
  S: IssueStore + IdentityStore + 'static,
  A: AuditStore + 'static,
{
  pub fn new(store: Arc<S>, audit: Arc<A>) -> Self { Self { store, audit } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  // ── Issues ────────────────────────────────────────────────────────────────

  pub async fn create_issue(&self, draft: IssueDraft) -> Result<Issue> {
    let input = draft.validate()?;
    let issue = self
      .store
      .insert_issue(input)
      .await
      .map_err(Error::persistence)?;

    let initial = issue.status.unwrap_or(IssueStatus::Open);
    self.spawn_audit(NewAuditEntry {
      issue_id:    Some(issue.issue_id),
      issue_title: issue.title.clone(),
      actor_id:    None,
      actor:       issue.username.clone(),
      action:      ACTION_CREATED.to_owned(),
      details:     format!(
        "{} reported issue {} with status {initial}",
        issue.username, issue.issue_id
      ),
      meta:        meta([("initialStatus", json!(initial.as_str()))]),
    });

    Ok(issue)
  }

  pub async fn list_issues(&self) -> Result<Vec<IssueSummary>> {
    let issues = self.store.list_issues().await.map_err(Error::persistence)?;
    Ok(issues.iter().map(Issue::summary).collect())
  }

  pub async fn get_issue(&self, raw_id: &str) -> Result<Issue> {
    let id = parse_reference("issue", raw_id)?;
    self.load_issue(id).await
  }

  /// Move an issue to `raw_status`. Checks, in order: id shape, status
  /// value, actor capability, issue existence.
  pub async fn update_status(
    &self,
    raw_id: &str,
    raw_status: &str,
    actor: &Actor,
  ) -> Result<Issue> {
    let id = parse_reference("issue", raw_id)?;
    let target: IssueStatus = raw_status.parse()?;
    if !actor.can(Capability::ChangeIssueStatus) {
      return Err(Error::PermissionDenied(
        "Only volunteers or admins can update issue status".into(),
      ));
    }

    let mut issue = self.load_issue(id).await?;
    let previous = issue.status;
    issue.status = Some(target);
    let issue = self.save(issue).await?;

    tracing::info!(
      issue_id = %issue.issue_id,
      previous = ?previous,
      new = %target,
      actor = actor.display_name(),
      "issue status updated"
    );

    self.spawn_audit(NewAuditEntry {
      issue_id:    Some(issue.issue_id),
      issue_title: issue.title.clone(),
      actor_id:    Some(actor.identity_id),
      actor:       actor.display_name().to_owned(),
      action:      ACTION_STATUS_UPDATE.to_owned(),
      details:     format!(
        "{} changed status to {target} for issue {}",
        actor.display_name(),
        issue.issue_id
      ),
      meta:        meta([
        ("previousStatus", json!(previous.map(IssueStatus::as_str))),
        ("newStatus", json!(target.as_str())),
      ]),
    });

    Ok(issue)
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  pub async fn comments(&self, raw_id: &str) -> Result<Vec<Comment>> {
    Ok(self.get_issue(raw_id).await?.comments)
  }

  /// Append a comment by `actor` and return it.
  pub async fn add_comment(
    &self,
    raw_id: &str,
    text: &str,
    actor: &Actor,
  ) -> Result<Comment> {
    let text = required_text(text, "Comment")?;
    let mut issue = self.get_issue(raw_id).await?;

    let comment = Comment::new(actor, text);
    issue.comments.push(comment.clone());
    self.save(issue).await?;
    Ok(comment)
  }

  /// Toggle `actor`'s like on a comment and return the updated comment.
  pub async fn like_comment(
    &self,
    raw_issue_id: &str,
    raw_comment_id: &str,
    actor: &Actor,
  ) -> Result<Comment> {
    let (mut issue, comment_id) =
      self.load_for_comment(raw_issue_id, raw_comment_id).await?;

    let comment = issue
      .comment_mut(comment_id)
      .ok_or(Error::NotFound("comment"))?;
    let outcome = comment.toggle_like(actor.identity_id);
    let updated = comment.clone();

    self.save(issue).await?;
    tracing::debug!(%comment_id, ?outcome, likes = updated.likes(), "like toggled");
    Ok(updated)
  }

  /// Toggle `actor`'s dislike on a comment and return the updated comment.
  pub async fn dislike_comment(
    &self,
    raw_issue_id: &str,
    raw_comment_id: &str,
    actor: &Actor,
  ) -> Result<Comment> {
    let (mut issue, comment_id) =
      self.load_for_comment(raw_issue_id, raw_comment_id).await?;

    let comment = issue
      .comment_mut(comment_id)
      .ok_or(Error::NotFound("comment"))?;
    let outcome = comment.toggle_dislike(actor.identity_id);
    let updated = comment.clone();

    self.save(issue).await?;
    tracing::debug!(
      %comment_id,
      ?outcome,
      dislikes = updated.dislikes(),
      "dislike toggled"
    );
    Ok(updated)
  }

  /// Append a reply to a comment and return the updated comment.
  pub async fn add_reply(
    &self,
    raw_issue_id: &str,
    raw_comment_id: &str,
    text: &str,
    actor: &Actor,
  ) -> Result<Comment> {
    let text = required_text(text, "Reply")?;
    let (mut issue, comment_id) =
      self.load_for_comment(raw_issue_id, raw_comment_id).await?;

    let comment = issue
      .comment_mut(comment_id)
      .ok_or(Error::NotFound("comment"))?;
    comment.add_reply(Reply::new(actor, text));
    let updated = comment.clone();

    self.save(issue).await?;
    Ok(updated)
  }

  // ── Audit log ─────────────────────────────────────────────────────────────

  /// Most recent audit entries, newest first, with display fields resolved.
  ///
  /// A missing or unreadable issue/identity only affects its own entry.
  pub async fn recent_logs(
    &self,
    limit: Option<usize>,
  ) -> Result<Vec<AuditLogView>> {
    let entries = self
      .audit
      .recent_logs(clamp_limit(limit))
      .await
      .map_err(Error::persistence)?;

    let mut views = Vec::with_capacity(entries.len());
    for entry in entries {
      let live_title = match entry.issue_id {
        Some(id) if entry.issue_title.is_empty() => self
          .store
          .get_issue(id)
          .await
          .inspect_err(|e| tracing::debug!(error = %e, %id, "issue title lookup failed"))
          .ok()
          .flatten()
          .map(|issue| issue.title),
        _ => None,
      };

      let identity = match entry.actor_id {
        Some(id) if entry.actor.is_empty() => self
          .store
          .get_identity(id)
          .await
          .inspect_err(|e| tracing::debug!(error = %e, %id, "actor lookup failed"))
          .ok()
          .flatten(),
        _ => None,
      };

      let title = resolve_issue_title(&entry.issue_title, live_title.as_deref());
      let actor = resolve_actor(&entry.actor, identity.as_ref());
      views.push(AuditLogView::new(entry, title, actor));
    }

    Ok(views)
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  async fn load_issue(&self, id: Uuid) -> Result<Issue> {
    self
      .store
      .get_issue(id)
      .await
      .map_err(Error::persistence)?
      .ok_or(Error::NotFound("issue"))
  }

  /// Validate both references before touching the store.
  async fn load_for_comment(
    &self,
    raw_issue_id: &str,
    raw_comment_id: &str,
  ) -> Result<(Issue, Uuid)> {
    let issue_id = parse_reference("issue", raw_issue_id)?;
    let comment_id = parse_reference("comment", raw_comment_id)?;
    let issue = self.load_issue(issue_id).await?;
    Ok((issue, comment_id))
  }

  async fn save(&self, issue: Issue) -> Result<Issue> {
    self.store.save_issue(issue).await.map_err(Error::persistence)
  }

  /// Write an audit entry without waiting for it.
  fn spawn_audit(&self, entry: NewAuditEntry) {
    let audit = Arc::clone(&self.audit);
    tokio::spawn(async move {
      let action = entry.action.clone();
      let issue_id = entry.issue_id;
      if let Err(e) = audit.append_log(entry).await {
        tracing::warn!(error = %e, %action, ?issue_id, "failed to write audit log entry");
      }
    });
  }
}

fn required_text(text: &str, what: &str) -> Result<String> {
  let trimmed = text.trim();
  if trimmed.is_empty() {
    return Err(Error::Validation(format!("{what} text is required")));
  }
  Ok(trimmed.to_owned())
}

fn meta<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
  pairs
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v))
    .collect()
}
