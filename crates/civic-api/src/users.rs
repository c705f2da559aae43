//! Handlers for `/users` endpoints: registration, login and profiles.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users/register` | Body: [`RegisterBody`]; returns 201 + profile |
//! | `POST` | `/users/login` | Body: [`LoginBody`]; returns `{message, user}` |
//! | `GET`  | `/users/profile` | The caller's profile |
//! | `PUT`  | `/users/profile` | Body: [`ProfileBody`] |
//! | `GET`  | `/users` | Every profile; admins only |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use civic_core::{
  Error as CoreError,
  identity::{Capability, NewIdentity, Profile, ProfileUpdate, Role},
  store::{AuditStore, IdentityStore, IssueStore},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
  AppState,
  auth::{CurrentUser, authenticate, hash_password},
  error::Result,
  extract::JsonBody,
};

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:    Option<String>,
  pub password: Option<String>,
  /// `user`, `volunteer` or `admin`. Defaults to `user`.
  pub role:     Option<String>,
  #[serde(default)]
  pub name:     String,
  #[serde(default)]
  pub username: String,
}

/// `POST /users/register`
pub async fn register<S, A>(
  State(state): State<AppState<S, A>>,
  JsonBody(body): JsonBody<RegisterBody>,
) -> Result<impl IntoResponse>
where
  S: IssueStore + IdentityStore + 'static,
  A: AuditStore + 'static,
{
  let email = body.email.as_deref().map(str::trim).unwrap_or_default();
  let password = body.password.as_deref().unwrap_or_default();
  if email.is_empty() || password.is_empty() {
    return Err(CoreError::Validation("Email and password are required".into()).into());
  }

  let role = match body.role.as_deref().map(str::trim) {
    None | Some("") => Role::default(),
    Some(raw) => raw.parse()?,
  };

  let store = state.service.store();
  if store
    .find_identity_by_email(email)
    .await
    .map_err(CoreError::persistence)?
    .is_some()
  {
    return Err(CoreError::Conflict("User already exists".into()).into());
  }

  let identity = store
    .create_identity(NewIdentity {
      email: email.to_owned(),
      password_hash: hash_password(password)?,
      role,
      name: body.name,
      username: body.username,
    })
    .await
    .map_err(Into::<CoreError>::into)?;

  tracing::info!(identity_id = %identity.identity_id, %role, "identity registered");
  Ok((StatusCode::CREATED, Json(Profile::from(&identity))))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  #[serde(default)]
  pub email:    String,
  #[serde(default)]
  pub password: String,
}

/// `POST /users/login`
pub async fn login<S, A>(
  State(state): State<AppState<S, A>>,
  JsonBody(body): JsonBody<LoginBody>,
) -> Result<impl IntoResponse>
where
  S: IssueStore + IdentityStore + 'static,
  A: AuditStore + 'static,
{
  let identity =
    authenticate(state.service.store().as_ref(), &body.email, &body.password)
      .await?;
  Ok(Json(json!({
    "message": "Login successful",
    "user": Profile::from(&identity),
  })))
}

// ─── Profile ──────────────────────────────────────────────────────────────────

/// `GET /users/profile`
pub async fn profile(user: CurrentUser) -> Json<Profile> {
  Json(Profile::from(&user.0))
}

/// Fields a caller may change on their own profile. Role is not among them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBody {
  pub email:      Option<String>,
  pub password:   Option<String>,
  pub name:       Option<String>,
  pub username:   Option<String>,
  pub location:   Option<String>,
  pub citizen_id: Option<String>,
  pub avatar:     Option<String>,
}

/// `PUT /users/profile`
pub async fn update_profile<S, A>(
  State(state): State<AppState<S, A>>,
  CurrentUser(mut identity): CurrentUser,
  JsonBody(body): JsonBody<ProfileBody>,
) -> Result<Json<Profile>>
where
  S: IssueStore + IdentityStore + 'static,
  A: AuditStore + 'static,
{
  let store = state.service.store();

  if let Some(email) = body.email.as_deref().map(str::trim)
    && !email.is_empty()
    && let Some(owner) = store
      .find_identity_by_email(email)
      .await
      .map_err(CoreError::persistence)?
    && owner.identity_id != identity.identity_id
  {
    return Err(CoreError::Conflict("Email already in use".into()).into());
  }

  let password_hash = match body.password.as_deref() {
    Some(p) if !p.is_empty() => Some(hash_password(p)?),
    _ => None,
  };

  ProfileUpdate {
    email: body.email,
    password_hash,
    name: body.name,
    username: body.username,
    location: body.location,
    citizen_id: body.citizen_id,
    avatar: body.avatar,
  }
  .apply(&mut identity);

  let saved = store
    .save_identity(identity)
    .await
    .map_err(Into::<CoreError>::into)?;
  Ok(Json(Profile::from(&saved)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /users`
pub async fn list<S, A>(
  State(state): State<AppState<S, A>>,
  user: CurrentUser,
) -> Result<Json<Vec<Profile>>>
where
  S: IssueStore + IdentityStore + 'static,
  A: AuditStore + 'static,
{
  if !user.actor().can(Capability::ListIdentities) {
    return Err(CoreError::PermissionDenied("Admin access required".into()).into());
  }

  let identities = state
    .service
    .store()
    .list_identities()
    .await
    .map_err(CoreError::persistence)?;
  Ok(Json(identities.iter().map(Profile::from).collect()))
}
