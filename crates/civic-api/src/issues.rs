//! Handlers for `/issues` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/issues/create` | Body: [`IssueDraft`]; returns 201 `{message, issue}` |
//! | `GET`   | `/issues/all` | Listing projection of every issue |
//! | `GET`   | `/issues/{id}` | Full issue including comments |
//! | `PATCH` | `/issues/{id}/status` | Body: `{"status":"Closed"}`; volunteers and admins only |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use civic_core::{
  issue::{Issue, IssueDraft, IssueSummary},
  store::{AuditStore, IdentityStore, IssueStore},
};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, auth::CurrentUser, error::Result, extract::JsonBody};

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /issues/create`
pub async fn create<S, A>(
  State(state): State<AppState<S, A>>,
  JsonBody(draft): JsonBody<IssueDraft>,
) -> Result<impl IntoResponse>
where
  S: IssueStore + IdentityStore + 'static,
  A: AuditStore + 'static,
{
  let issue = state.service.create_issue(draft).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "Issue created successfully", "issue": issue })),
  ))
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /issues/all`
pub async fn list<S, A>(
  State(state): State<AppState<S, A>>,
) -> Result<Json<Vec<IssueSummary>>>
where
  S: IssueStore + IdentityStore + 'static,
  A: AuditStore + 'static,
{
  Ok(Json(state.service.list_issues().await?))
}

/// `GET /issues/{id}`
pub async fn get_one<S, A>(
  State(state): State<AppState<S, A>>,
  Path(id): Path<String>,
) -> Result<Json<Issue>>
where
  S: IssueStore + IdentityStore + 'static,
  A: AuditStore + 'static,
{
  Ok(Json(state.service.get_issue(&id).await?))
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  #[serde(default)]
  pub status: String,
}

/// `PATCH /issues/{id}/status`
pub async fn update_status<S, A>(
  State(state): State<AppState<S, A>>,
  Path(id): Path<String>,
  user: CurrentUser,
  JsonBody(body): JsonBody<StatusBody>,
) -> Result<impl IntoResponse>
where
  S: IssueStore + IdentityStore + 'static,
  A: AuditStore + 'static,
{
  let issue = state
    .service
    .update_status(&id, &body.status, &user.actor())
    .await?;
  Ok(Json(json!({ "message": "Status updated", "issue": issue })))
}
