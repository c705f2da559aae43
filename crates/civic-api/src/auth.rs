//! HTTP Basic-auth extractor and credential helpers.
//!
//! Credentials are `email:password`; the password is checked against the
//! argon2 PHC string stored on the identity.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use civic_core::{
  Error as CoreError,
  identity::{Actor, Identity},
  store::{AuditStore, IdentityStore, IssueStore},
};
use rand_core::OsRng;

use crate::{
  AppState,
  error::{ApiError, Result},
};

const BAD_CREDENTIALS: &str = "Invalid email or password";

/// The authenticated identity behind a request.
pub struct CurrentUser(pub Identity);

impl CurrentUser {
  pub fn actor(&self) -> Actor { Actor::from(&self.0) }
}

/// Produce an argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::PasswordHash(e.to_string()))
}

/// `true` if `password` matches the stored PHC string. A malformed stored
/// hash never matches.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

/// Look up `email` and check `password` against it.
///
/// Unknown email and wrong password fail identically.
pub async fn authenticate<S>(
  store: &S,
  email: &str,
  password: &str,
) -> Result<Identity>
where
  S: IdentityStore,
{
  let identity = store
    .find_identity_by_email(email)
    .await
    .map_err(CoreError::persistence)?
    .filter(|identity| verify_password(password, &identity.password_hash))
    .ok_or_else(|| CoreError::Unauthorized(BAD_CREDENTIALS.into()))?;

  tracing::debug!(identity_id = %identity.identity_id, "authenticated");
  Ok(identity)
}

/// Split a `Basic` authorization header into `(email, password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String)> {
  let unauthorized =
    || ApiError::from(CoreError::Unauthorized("Not authorized".into()));

  let value = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(unauthorized)?;

  // Auth schemes are case-insensitive.
  let (scheme, encoded) = value.trim_start().split_once(' ').ok_or_else(unauthorized)?;
  if !scheme.eq_ignore_ascii_case("basic") {
    return Err(unauthorized());
  }
  let decoded = B64.decode(encoded.trim()).map_err(|_| unauthorized())?;
  let creds = String::from_utf8(decoded).map_err(|_| unauthorized())?;

  let (email, password) = creds.split_once(':').ok_or_else(unauthorized)?;
  Ok((email.to_owned(), password.to_owned()))
}

impl<S, A> FromRequestParts<AppState<S, A>> for CurrentUser
where
  S: IssueStore + IdentityStore + 'static,
  A: AuditStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, A>,
  ) -> Result<Self, Self::Rejection> {
    let (email, password) = basic_credentials(&parts.headers)?;
    let identity =
      authenticate(state.service.store().as_ref(), &email, &password).await?;
    Ok(CurrentUser(identity))
  }
}
