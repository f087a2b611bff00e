use std::time::Duration;

use keahlian_sheet::ParseOptions;
use serde::{Deserialize, Serialize};

/// Tunables for the upload/import endpoints. Every field has a default, so an
/// absent `[import]` table in the server config is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
  /// Number of records returned in `sample_data`.
  #[serde(default = "default_sample_size")]
  pub sample_size:        usize,
  /// How long a processed upload stays staged for import.
  #[serde(default = "default_session_ttl_secs")]
  pub session_ttl_secs:   u64,
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes:   usize,
  /// Fill missing gender and age from the IC number.
  #[serde(default = "default_infer_demographics")]
  pub infer_demographics: bool,
}

fn default_sample_size() -> usize { 5 }

fn default_session_ttl_secs() -> u64 { 60 * 60 }

fn default_max_upload_bytes() -> usize { 10 * 1024 * 1024 }

fn default_infer_demographics() -> bool { true }

impl Default for ImportSettings {
  fn default() -> Self {
    Self {
      sample_size:        default_sample_size(),
      session_ttl_secs:   default_session_ttl_secs(),
      max_upload_bytes:   default_max_upload_bytes(),
      infer_demographics: default_infer_demographics(),
    }
  }
}

impl ImportSettings {
  pub fn session_ttl(&self) -> Duration { Duration::from_secs(self.session_ttl_secs) }

  /// Parser options for a request arriving now.
  pub fn parse_options(&self) -> ParseOptions {
    ParseOptions {
      infer_demographics: self.infer_demographics,
      ..ParseOptions::default()
    }
  }
}
