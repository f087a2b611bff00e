//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("caller identity is missing")]
  Unauthorized,

  #[error("invalid file: {0}")]
  InvalidFile(#[from] keahlian_sheet::Error),

  #[error("encoding error: {0}")]
  Encode(#[from] serde_json::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<keahlian_core::Error> for ApiError {
  fn from(e: keahlian_core::Error) -> Self {
    match e {
      keahlian_core::Error::MissingIdentity => ApiError::Unauthorized,
      e @ keahlian_core::Error::DuplicateSourceRow(_) => ApiError::BadRequest(e.to_string()),
      keahlian_core::Error::Store(e) => ApiError::Store(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::InvalidFile(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Encode(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    let message = match &self {
      ApiError::NotFound(m) | ApiError::BadRequest(m) | ApiError::Conflict(m) => m.clone(),
      other => other.to_string(),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
