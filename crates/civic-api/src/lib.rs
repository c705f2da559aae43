//! JSON HTTP API for the civic reporting platform.
//!
//! Exposes an axum [`Router`] backed by an [`IssueService`] over any store
//! implementing the `civic_core::store` traits. Authenticated routes read HTTP
//! Basic credentials (`email:password`); TLS, CORS and tracing layers are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = civic_api::router(AppState::new(service)).layer(TraceLayer::new_for_http());
//! ```

pub mod auth;
pub mod comments;
pub mod error;
pub mod extract;
pub mod issues;
pub mod logs;
pub mod users;

use axum::{
  Router,
  routing::{get, patch, post},
};
use civic_core::{
  service::IssueService,
  store::{AuditStore, IdentityStore, IssueStore},
};

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, A> {
  pub service: IssueService<S, A>,
}

impl<S, A> AppState<S, A> {
  pub fn new(service: IssueService<S, A>) -> Self { Self { service } }
}

impl<S, A> Clone for AppState<S, A> {
  fn clone(&self) -> Self {
    Self {
      service: self.service.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full router: `GET /` plus everything under `/api`.
pub fn router<S, A>(state: AppState<S, A>) -> Router
where
  S: IssueStore + IdentityStore + 'static,
  A: AuditStore + 'static,
{
  let api = Router::new()
    // Users
    .route("/users", get(users::list::<S, A>))
    .route("/users/register", post(users::register::<S, A>))
    .route("/users/login", post(users::login::<S, A>))
    .route(
      "/users/profile",
      get(users::profile).put(users::update_profile::<S, A>),
    )
    // Issues
    .route("/issues/create", post(issues::create::<S, A>))
    .route("/issues/all", get(issues::list::<S, A>))
    .route("/issues/{id}", get(issues::get_one::<S, A>))
    .route("/issues/{id}/status", patch(issues::update_status::<S, A>))
    // Comments
    .route(
      "/issues/{id}/comments",
      get(comments::list::<S, A>).post(comments::create::<S, A>),
    )
    .route("/issues/{id}/comments/{cid}/like", post(comments::like::<S, A>))
    .route(
      "/issues/{id}/comments/{cid}/dislike",
      post(comments::dislike::<S, A>),
    )
    .route(
      "/issues/{id}/comments/{cid}/replies",
      post(comments::reply::<S, A>),
    )
    // Audit log
    .route("/logs", get(logs::list::<S, A>));

  Router::new()
    .route("/", get(root))
    .nest("/api", api)
    .with_state(state)
}

async fn root() -> &'static str { "API is running..." }
