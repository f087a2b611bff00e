//! HTTP Basic-auth verification and the middleware that turns a verified
//! username into a [`CallerIdentity`].

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use keahlian_api::CallerIdentity;
use rand_core::OsRng;

use crate::{UserConfig, error::Error};

/// Accounts accepted by this server instance.
#[derive(Clone, Default)]
pub struct AuthConfig {
  pub users: Vec<UserConfig>,
}

/// Argon2 PHC string for `password` under a fresh salt, as stored in a
/// `[[users]]` entry.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Verify credentials from headers and return who the caller is.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<CallerIdentity, Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  let user = config
    .users
    .iter()
    .find(|u| u.username == username)
    .ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&user.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(CallerIdentity(user.username.clone()))
}

/// Reject unauthenticated requests; attach the caller's identity to the rest.
pub async fn require_auth(
  State(auth): State<Arc<AuthConfig>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  let identity = match verify_auth(req.headers(), &auth) {
    Ok(identity) => identity,
    Err(e) => {
      tracing::debug!(path = %req.uri().path(), "rejected unauthenticated request");
      return Err(e);
    }
  };
  req.extensions_mut().insert(identity);
  Ok(next.run(req).await)
}
