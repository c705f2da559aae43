//! `GET /logs`: recent audit entries, newest first.

use axum::{
  Json,
  extract::{Query, State},
};
use civic_core::{
  audit::AuditLogView,
  store::{AuditStore, IdentityStore, IssueStore},
};
use serde::Deserialize;

use crate::{AppState, error::Result};

#[derive(Debug, Default, Deserialize)]
pub struct LogParams {
  /// Raw query value; anything but a non-negative integer means "not
  /// supplied".
  pub limit: Option<String>,
}

impl LogParams {
  pub fn limit(&self) -> Option<usize> {
    self.limit.as_deref().and_then(|l| l.trim().parse().ok())
  }
}

/// `GET /logs[?limit=N]`, default 50, capped at 200.
pub async fn list<S, A>(
  State(state): State<AppState<S, A>>,
  Query(params): Query<LogParams>,
) -> Result<Json<Vec<AuditLogView>>>
where
  S: IssueStore + IdentityStore + 'static,
  A: AuditStore + 'static,
{
  Ok(Json(state.service.recent_logs(params.limit()).await?))
}
