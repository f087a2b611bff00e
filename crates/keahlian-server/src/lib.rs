//! HTTP server for Keahlian.
//!
//! Wraps the [`keahlian_api`] router with Basic authentication, request
//! tracing and a health probe.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, middleware, routing::get};
use keahlian_api::ImportSettings;
use keahlian_core::store::MemberStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `KEAHLIAN_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub users:      Vec<UserConfig>,
  #[serde(default)]
  pub import:     ImportSettings,
}

impl ServerConfig {
  /// Read `path` (skipped when absent) and layer `KEAHLIAN_*` environment
  /// variables over it. Nested keys use `__`: `KEAHLIAN_IMPORT__SAMPLE_SIZE`.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    Self::load_with_env(path, None)
  }

  fn load_with_env(
    path: &Path,
    env: Option<config::Map<String, String>>,
  ) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("KEAHLIAN")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true)
          .source(env),
      )
      .build()?
      .try_deserialize()
  }

  /// `store_path` with a leading `~/` resolved against `$HOME`.
  pub fn resolved_store_path(&self) -> PathBuf {
    let s = self.store_path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/")
      && let Ok(home) = std::env::var("HOME")
    {
      return PathBuf::from(home).join(rest);
    }
    self.store_path.clone()
  }
}

/// One branch-office account.
#[derive(Deserialize, Clone)]
pub struct UserConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full server router: `/health` is open, everything under `/api`
/// requires Basic auth.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: MemberStore + 'static,
{
  let auth = Arc::new(AuthConfig {
    users: config.users.clone(),
  });

  let api = keahlian_api::api_router(store, config.import.clone())
    .layer(middleware::from_fn_with_state(auth, require_auth));

  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }

// ─── Integration tests ────────────────────────────────────────────────────────
