//! Who is calling. The API does not authenticate; the embedding server does,
//! and attaches the result as a [`CallerIdentity`] request extension.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// The authenticated username of the caller, recorded as `uploaded_by` on
/// imports and `reviewed_by` on review decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub String);

impl<S> FromRequestParts<S> for CallerIdentity
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<CallerIdentity>()
      .filter(|id| !id.0.trim().is_empty())
      .cloned()
      .ok_or(ApiError::Unauthorized)
  }
}
