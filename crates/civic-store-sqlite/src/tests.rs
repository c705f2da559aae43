//! Integration tests for `SqliteStore` and `IssueService` against an
//! in-memory database.

use std::{sync::Arc, time::Duration};

use civic_core::{
  Error as CoreError,
  audit::{AuditLogEntry, NewAuditEntry},
  identity::{Actor, NewIdentity, Role},
  issue::{IssueDraft, IssueStatus, NewIssue},
  service::IssueService,
  store::{AuditStore, IdentityStore, IssueStore},
};
use serde_json::Map;
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn pothole() -> IssueDraft {
  IssueDraft {
    title: Some("Pothole on Main St".into()),
    priority: Some("High".into()),
    priority_level: Some("3".into()),
    description: Some("Large pothole".into()),
    address: Some("Main St".into()),
    images: vec!["https://img.example.com/pothole.jpg".into()],
    username: Some("alice".into()),
    ..Default::default()
  }
}

fn new_issue() -> NewIssue { pothole().validate().unwrap() }

async fn register(s: &SqliteStore, username: &str, role: Role) -> Actor {
  let identity = s
    .create_identity(NewIdentity {
      email: format!("{username}@example.com"),
      password_hash: "$argon2id$placeholder".into(),
      role,
      name: String::new(),
      username: username.into(),
    })
    .await
    .unwrap();
  Actor::from(&identity)
}

fn entry(action: &str) -> NewAuditEntry {
  NewAuditEntry {
    issue_id:    None,
    issue_title: String::new(),
    actor_id:    None,
    actor:       String::new(),
    action:      action.into(),
    details:     String::new(),
    meta:        Map::new(),
  }
}

/// Poll until the detached audit writer has stored `n` entries.
async fn wait_for_logs(s: &SqliteStore, n: usize) -> Vec<AuditLogEntry> {
  for _ in 0..100 {
    let logs = s.recent_logs(200).await.unwrap();
    if logs.len() >= n {
      return logs;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  panic!("expected {n} audit entries");
}

// ─── Issues ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_issue() {
  let s = store().await;
  let issue = s.insert_issue(new_issue()).await.unwrap();
  assert_eq!(issue.status, Some(IssueStatus::Open));
  assert!(issue.created_at.is_some());

  let fetched = s.get_issue(issue.issue_id).await.unwrap().unwrap();
  assert_eq!(fetched.title, "Pothole on Main St");
  assert_eq!(fetched.images, issue.images);
  assert_eq!(fetched.created_at, issue.created_at);
}

#[tokio::test]
async fn get_issue_missing_returns_none() {
  let s = store().await;
  assert!(s.get_issue(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn save_issue_replaces_whole_document() {
  let s = store().await;
  let mut issue = s.insert_issue(new_issue()).await.unwrap();
  let alice = register(&s, "alice", Role::User).await;

  issue.status = Some(IssueStatus::Closed);
  issue
    .comments
    .push(civic_core::comment::Comment::new(&alice, "Fixed?".into()));
  let saved = s.save_issue(issue.clone()).await.unwrap();
  assert!(saved.updated_at >= issue.updated_at);

  let fetched = s.get_issue(issue.issue_id).await.unwrap().unwrap();
  assert_eq!(fetched.status, Some(IssueStatus::Closed));
  assert_eq!(fetched.comments.len(), 1);
  assert_eq!(fetched.comments[0].username, "alice");
}

#[tokio::test]
async fn save_issue_missing_errors() {
  let s = store().await;
  let mut issue = s.insert_issue(new_issue()).await.unwrap();
  issue.issue_id = Uuid::new_v4();
  let err = s.save_issue(issue).await.unwrap_err();
  assert!(matches!(err, crate::Error::IssueNotFound(_)));
}

#[tokio::test]
async fn list_issues_returns_all() {
  let s = store().await;
  s.insert_issue(new_issue()).await.unwrap();
  s.insert_issue(new_issue()).await.unwrap();
  assert_eq!(s.list_issues().await.unwrap().len(), 2);
}

// ─── Identities ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_find_identity() {
  let s = store().await;
  let bob = register(&s, "bob", Role::Volunteer).await;

  let by_email = s
    .find_identity_by_email("bob@example.com")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(by_email.identity_id, bob.identity_id);
  assert_eq!(by_email.role, Role::Volunteer);

  let by_id = s.get_identity(bob.identity_id).await.unwrap().unwrap();
  assert_eq!(by_id.username, "bob");
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  register(&s, "bob", Role::User).await;
  let err = s
    .create_identity(NewIdentity {
      email: "bob@example.com".into(),
      password_hash: "x".into(),
      role: Role::User,
      name: String::new(),
      username: "bobby".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::EmailTaken(_)));
}

#[tokio::test]
async fn concurrent_registrations_yield_one_conflict() {
  let s = store().await;
  let input = || NewIdentity {
    email:         "dup@example.com".into(),
    password_hash: "x".into(),
    role:          Role::User,
    name:          String::new(),
    username:      "dup".into(),
  };

  let (a, b) = tokio::join!(s.create_identity(input()), s.create_identity(input()));
  let (ok, err) = match (a, b) {
    (Ok(i), Err(e)) | (Err(e), Ok(i)) => (i, e),
    other => panic!("expected exactly one success, got {other:?}"),
  };
  assert_eq!(ok.email, "dup@example.com");
  assert!(matches!(err, crate::Error::EmailTaken(_)));
  assert!(matches!(CoreError::from(err), CoreError::Conflict(_)));
  assert_eq!(s.list_identities().await.unwrap().len(), 1);
}

#[test]
fn store_errors_convert_to_core_kinds() {
  let taken = CoreError::from(crate::Error::EmailTaken("a@example.com".into()));
  assert!(matches!(taken, CoreError::Conflict(_)));

  let missing = CoreError::from(crate::Error::IssueNotFound(Uuid::new_v4()));
  assert!(matches!(missing, CoreError::Persistence(_)));
}

#[tokio::test]
async fn save_identity_rejects_taken_email() {
  let s = store().await;
  register(&s, "bob", Role::User).await;
  let carol = register(&s, "carol", Role::User).await;

  let mut identity = s.get_identity(carol.identity_id).await.unwrap().unwrap();
  identity.email = "bob@example.com".into();
  let err = s.save_identity(identity).await.unwrap_err();
  assert!(matches!(err, crate::Error::EmailTaken(_)));
}

#[tokio::test]
async fn save_identity_persists_profile_fields() {
  let s = store().await;
  let carol = register(&s, "carol", Role::User).await;

  let mut identity = s.get_identity(carol.identity_id).await.unwrap().unwrap();
  identity.location = "Springfield".into();
  identity.avatar = "https://img.example.com/carol.png".into();
  s.save_identity(identity).await.unwrap();

  let fetched = s.get_identity(carol.identity_id).await.unwrap().unwrap();
  assert_eq!(fetched.location, "Springfield");
  assert_eq!(fetched.avatar, "https://img.example.com/carol.png");
  assert_eq!(s.list_identities().await.unwrap().len(), 1);
}

// ─── Audit log ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn recent_logs_newest_first_and_limited() {
  let s = store().await;
  for action in ["first", "second", "third"] {
    s.append_log(entry(action)).await.unwrap();
  }

  let logs = s.recent_logs(2).await.unwrap();
  let actions: Vec<&str> = logs.iter().map(|l| l.action.as_str()).collect();
  assert_eq!(actions, ["third", "second"]);
}

#[tokio::test]
async fn audit_meta_roundtrip() {
  let s = store().await;
  let mut input = entry("Status Update");
  input.meta.insert("previousStatus".into(), "Open".into());
  input.meta.insert("newStatus".into(), "Closed".into());
  s.append_log(input).await.unwrap();

  let logs = s.recent_logs(10).await.unwrap();
  assert_eq!(logs[0].meta["newStatus"], "Closed");
  assert_eq!(logs[0].meta["previousStatus"], "Open");
}

// ─── IssueService ────────────────────────────────────────────────────────────

fn service(s: &SqliteStore) -> IssueService<SqliteStore, SqliteStore> {
  let shared = Arc::new(s.clone());
  IssueService::new(Arc::clone(&shared), shared)
}

/// An audit store whose writes always fail.
struct BrokenAudit;

#[derive(Debug, thiserror::Error)]
#[error("audit store unavailable")]
struct BrokenAuditError;

impl AuditStore for BrokenAudit {
  type Error = BrokenAuditError;

  async fn append_log(&self, _: NewAuditEntry) -> Result<AuditLogEntry, Self::Error> {
    Err(BrokenAuditError)
  }

  async fn recent_logs(&self, _: usize) -> Result<Vec<AuditLogEntry>, Self::Error> {
    Err(BrokenAuditError)
  }
}

#[tokio::test]
async fn create_then_list() {
  let s = store().await;
  let svc = service(&s);
  svc.create_issue(pothole()).await.unwrap();

  let listed = svc.list_issues().await.unwrap();
  let row = listed
    .iter()
    .find(|i| i.title == "Pothole on Main St")
    .unwrap();
  assert_eq!(row.status, "Open");
  assert_eq!(row.location, "Main St");
  assert_eq!(row.date.len(), 10);
}

#[tokio::test]
async fn create_writes_created_audit_entry() {
  let s = store().await;
  let svc = service(&s);
  let issue = svc.create_issue(pothole()).await.unwrap();

  let logs = wait_for_logs(&s, 1).await;
  assert_eq!(logs[0].action, "Created");
  assert_eq!(logs[0].issue_id, Some(issue.issue_id));
  assert_eq!(logs[0].issue_title, "Pothole on Main St");
  assert_eq!(logs[0].actor, "alice");
  assert_eq!(logs[0].meta["initialStatus"], "Open");
}

#[tokio::test]
async fn create_missing_field_persists_nothing() {
  let s = store().await;
  let svc = service(&s);
  let mut draft = pothole();
  draft.address = None;

  let err = svc.create_issue(draft).await.unwrap_err();
  assert!(matches!(err, CoreError::Validation(_)));
  assert!(s.list_issues().await.unwrap().is_empty());
}

#[tokio::test]
async fn volunteer_closes_issue_with_audit() {
  let s = store().await;
  let svc = service(&s);
  let vol = register(&s, "vol_ann", Role::Volunteer).await;
  let issue = svc.create_issue(pothole()).await.unwrap();
  let id = issue.issue_id.to_string();

  let updated = svc.update_status(&id, "Closed", &vol).await.unwrap();
  assert_eq!(updated.status, Some(IssueStatus::Closed));

  let logs = wait_for_logs(&s, 2).await;
  let log = logs.iter().find(|l| l.action == "Status Update").unwrap();
  assert_eq!(log.actor, "vol_ann");
  assert_eq!(log.actor_id, Some(vol.identity_id));
  assert_eq!(log.meta["previousStatus"], "Open");
  assert_eq!(log.meta["newStatus"], "Closed");
  assert!(log.details.contains(&id));
}

#[tokio::test]
async fn status_change_by_user_is_denied() {
  let s = store().await;
  let svc = service(&s);
  let user = register(&s, "joe", Role::User).await;
  let issue = svc.create_issue(pothole()).await.unwrap();
  let id = issue.issue_id.to_string();

  let err = svc.update_status(&id, "Closed", &user).await.unwrap_err();
  assert!(matches!(err, CoreError::PermissionDenied(_)));
  assert_eq!(
    svc.get_issue(&id).await.unwrap().status,
    Some(IssueStatus::Open)
  );
}

#[tokio::test]
async fn status_outside_enumeration_is_rejected() {
  let s = store().await;
  let svc = service(&s);
  let admin = register(&s, "root", Role::Admin).await;
  let issue = svc.create_issue(pothole()).await.unwrap();
  let id = issue.issue_id.to_string();

  for bad in ["Resolved", "In Review", "closed"] {
    let err = svc.update_status(&id, bad, &admin).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidStatus(_)));
  }
  assert_eq!(
    svc.get_issue(&id).await.unwrap().status,
    Some(IssueStatus::Open)
  );
}

#[tokio::test]
async fn status_checks_reference_then_existence() {
  let s = store().await;
  let svc = service(&s);
  let admin = register(&s, "root", Role::Admin).await;

  let err = svc.update_status("nope", "Closed", &admin).await.unwrap_err();
  assert!(matches!(err, CoreError::InvalidReference("issue")));

  let missing = Uuid::new_v4().to_string();
  let err = svc.update_status(&missing, "Closed", &admin).await.unwrap_err();
  assert!(matches!(err, CoreError::NotFound("issue")));
}

#[tokio::test]
async fn audit_failure_does_not_fail_transition() {
  let s = store().await;
  let shared = Arc::new(s.clone());
  let svc = IssueService::new(shared, Arc::new(BrokenAudit));
  let admin = register(&s, "root", Role::Admin).await;

  let issue = svc.create_issue(pothole()).await.unwrap();
  let id = issue.issue_id.to_string();

  let updated = svc.update_status(&id, "Closed", &admin).await.unwrap();
  assert_eq!(updated.status, Some(IssueStatus::Closed));
  assert_eq!(
    svc.get_issue(&id).await.unwrap().status,
    Some(IssueStatus::Closed)
  );
}

#[tokio::test]
async fn comment_then_vote_scenario() {
  let s = store().await;
  let svc = service(&s);
  let bob = register(&s, "bob", Role::User).await;
  let carol = register(&s, "carol", Role::User).await;
  let issue = svc.create_issue(pothole()).await.unwrap();
  let id = issue.issue_id.to_string();

  let comment = svc.add_comment(&id, "I see this too", &bob).await.unwrap();
  assert_eq!(comment.username, "bob");
  let cid = comment.comment_id.to_string();

  let liked = svc.like_comment(&id, &cid, &carol).await.unwrap();
  assert_eq!((liked.likes(), liked.dislikes()), (1, 0));
  assert_eq!(liked.liked_by(), &[carol.identity_id]);

  let disliked = svc.dislike_comment(&id, &cid, &carol).await.unwrap();
  assert_eq!((disliked.likes(), disliked.dislikes()), (0, 1));
  assert!(disliked.liked_by().is_empty());
  assert_eq!(disliked.disliked_by(), &[carol.identity_id]);

  // The stored document reflects the last toggle.
  let stored = svc.comments(&id).await.unwrap();
  assert_eq!(stored[0].disliked_by(), &[carol.identity_id]);
}

#[tokio::test]
async fn double_like_is_a_toggle() {
  let s = store().await;
  let svc = service(&s);
  let bob = register(&s, "bob", Role::User).await;
  let issue = svc.create_issue(pothole()).await.unwrap();
  let id = issue.issue_id.to_string();
  let cid = svc
    .add_comment(&id, "x", &bob)
    .await
    .unwrap()
    .comment_id
    .to_string();

  svc.like_comment(&id, &cid, &bob).await.unwrap();
  let again = svc.like_comment(&id, &cid, &bob).await.unwrap();
  assert_eq!(again.likes(), 0);
  assert!(again.liked_by().is_empty());
}

#[tokio::test]
async fn blank_comment_is_rejected() {
  let s = store().await;
  let svc = service(&s);
  let bob = register(&s, "bob", Role::User).await;
  let issue = svc.create_issue(pothole()).await.unwrap();
  let id = issue.issue_id.to_string();

  let err = svc.add_comment(&id, "   \n", &bob).await.unwrap_err();
  assert!(matches!(err, CoreError::Validation(_)));
  assert!(svc.comments(&id).await.unwrap().is_empty());
}

#[tokio::test]
async fn comment_on_missing_issue() {
  let s = store().await;
  let svc = service(&s);
  let bob = register(&s, "bob", Role::User).await;

  let err = svc.add_comment("bad-id", "hi", &bob).await.unwrap_err();
  assert!(matches!(err, CoreError::InvalidReference("issue")));

  let missing = Uuid::new_v4().to_string();
  let err = svc.add_comment(&missing, "hi", &bob).await.unwrap_err();
  assert!(matches!(err, CoreError::NotFound("issue")));
}

#[tokio::test]
async fn vote_on_missing_comment() {
  let s = store().await;
  let svc = service(&s);
  let bob = register(&s, "bob", Role::User).await;
  let issue = svc.create_issue(pothole()).await.unwrap();
  let id = issue.issue_id.to_string();

  let missing = Uuid::new_v4().to_string();
  let err = svc.like_comment(&id, &missing, &bob).await.unwrap_err();
  assert!(matches!(err, CoreError::NotFound("comment")));

  let err = svc.dislike_comment(&id, "zzz", &bob).await.unwrap_err();
  assert!(matches!(err, CoreError::InvalidReference("comment")));
}

#[tokio::test]
async fn reply_is_trimmed_and_appended() {
  let s = store().await;
  let svc = service(&s);
  let bob = register(&s, "bob", Role::User).await;
  let carol = register(&s, "carol", Role::User).await;
  let issue = svc.create_issue(pothole()).await.unwrap();
  let id = issue.issue_id.to_string();
  let cid = svc
    .add_comment(&id, "I see this too", &bob)
    .await
    .unwrap()
    .comment_id
    .to_string();

  let updated = svc
    .add_reply(&id, &cid, "  Reported to the city  ", &carol)
    .await
    .unwrap();
  assert_eq!(updated.replies.len(), 1);
  assert_eq!(updated.replies[0].text, "Reported to the city");
  assert_eq!(updated.replies[0].username, "carol");

  let err = svc.add_reply(&id, &cid, "", &carol).await.unwrap_err();
  assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn comment_snapshot_survives_profile_edit() {
  let s = store().await;
  let svc = service(&s);
  let bob = register(&s, "bob", Role::User).await;
  let issue = svc.create_issue(pothole()).await.unwrap();
  let id = issue.issue_id.to_string();
  svc.add_comment(&id, "first!", &bob).await.unwrap();

  let mut identity = s.get_identity(bob.identity_id).await.unwrap().unwrap();
  identity.username = "robert".into();
  s.save_identity(identity).await.unwrap();

  let comments = svc.comments(&id).await.unwrap();
  assert_eq!(comments[0].username, "bob");
}

#[tokio::test]
async fn log_view_falls_back_per_entry() {
  let s = store().await;
  let svc = service(&s);
  let issue = s.insert_issue(new_issue()).await.unwrap();
  let vol = register(&s, "vol_ann", Role::Volunteer).await;

  // Snapshot missing: live issue title and identity username are used.
  let mut live = entry("Status Update");
  live.issue_id = Some(issue.issue_id);
  live.actor_id = Some(vol.identity_id);
  s.append_log(live).await.unwrap();

  // References to documents that do not exist.
  let mut dangling = entry("Status Update");
  dangling.issue_id = Some(Uuid::new_v4());
  dangling.actor_id = Some(Uuid::new_v4());
  s.append_log(dangling).await.unwrap();

  let views = svc.recent_logs(None).await.unwrap();
  assert_eq!(views.len(), 2);
  assert_eq!(views[0].issue_title, "Untitled Issue");
  assert_eq!(views[0].actor, "Unknown");
  assert_eq!(views[1].issue_title, "Pothole on Main St");
  assert_eq!(views[1].actor, "vol_ann");
}

#[tokio::test]
async fn log_view_respects_limit() {
  let s = store().await;
  let svc = service(&s);
  for i in 0..5 {
    s.append_log(entry(&format!("action {i}"))).await.unwrap();
  }
  assert_eq!(svc.recent_logs(Some(3)).await.unwrap().len(), 3);
  assert_eq!(svc.recent_logs(Some(0)).await.unwrap().len(), 5);
}
