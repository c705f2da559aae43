//! Handlers for comments, votes and replies on an issue.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/issues/{id}/comments` | Comments in insertion order |
//! | `POST` | `/issues/{id}/comments` | Body: `{"text":"..."}`; returns 201 |
//! | `POST` | `/issues/{id}/comments/{cid}/like` | Toggle the caller's like |
//! | `POST` | `/issues/{id}/comments/{cid}/dislike` | Toggle the caller's dislike |
//! | `POST` | `/issues/{id}/comments/{cid}/replies` | Body: `{"text":"..."}`; returns 201 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use civic_core::{
  comment::Comment,
  store::{AuditStore, IdentityStore, IssueStore},
};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, auth::CurrentUser, error::Result, extract::JsonBody};

/// Body accepted by the comment and reply endpoints.
#[derive(Debug, Deserialize)]
pub struct TextBody {
  #[serde(default)]
  pub text: String,
}

/// `GET /issues/{id}/comments`
pub async fn list<S, A>(
  State(state): State<AppState<S, A>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<Comment>>>
where
  S: IssueStore + IdentityStore + 'static,
  A: AuditStore + 'static,
{
  Ok(Json(state.service.comments(&id).await?))
}

/// `POST /issues/{id}/comments`
pub async fn create<S, A>(
  State(state): State<AppState<S, A>>,
  Path(id): Path<String>,
  user: CurrentUser,
  JsonBody(body): JsonBody<TextBody>,
) -> Result<impl IntoResponse>
where
  S: IssueStore + IdentityStore + 'static,
  A: AuditStore + 'static,
{
  let comment = state
    .service
    .add_comment(&id, &body.text, &user.actor())
    .await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "Comment added", "comment": comment })),
  ))
}

/// `POST /issues/{id}/comments/{cid}/like`
pub async fn like<S, A>(
  State(state): State<AppState<S, A>>,
  Path((id, comment_id)): Path<(String, String)>,
  user: CurrentUser,
) -> Result<impl IntoResponse>
where
  S: IssueStore + IdentityStore + 'static,
  A: AuditStore + 'static,
{
  let comment = state
    .service
    .like_comment(&id, &comment_id, &user.actor())
    .await?;
  Ok(Json(json!({ "message": "Like toggled", "comment": comment })))
}

/// `POST /issues/{id}/comments/{cid}/dislike`
pub async fn dislike<S, A>(
  State(state): State<AppState<S, A>>,
  Path((id, comment_id)): Path<(String, String)>,
  user: CurrentUser,
) -> Result<impl IntoResponse>
where
  S: IssueStore + IdentityStore + 'static,
  A: AuditStore + 'static,
{
  let comment = state
    .service
    .dislike_comment(&id, &comment_id, &user.actor())
    .await?;
  Ok(Json(json!({ "message": "Dislike toggled", "comment": comment })))
}

/// `POST /issues/{id}/comments/{cid}/replies`
pub async fn reply<S, A>(
  State(state): State<AppState<S, A>>,
  Path((id, comment_id)): Path<(String, String)>,
  user: CurrentUser,
  JsonBody(body): JsonBody<TextBody>,
) -> Result<impl IntoResponse>
where
  S: IssueStore + IdentityStore + 'static,
  A: AuditStore + 'static,
{
  let comment = state
    .service
    .add_reply(&id, &comment_id, &body.text, &user.actor())
    .await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "Reply added", "comment": comment })),
  ))
}
