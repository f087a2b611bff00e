//! Wire types for the two-step upload: `process` stages a parsed batch,
//! `import` commits it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{duplicate::DuplicateFlag, member::CanonicalMember};

/// A row the parser could not turn into a valid record. The row itself is
/// still present in `all_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowParseFailure {
  pub row:    u32,
  pub reason: String,
}

/// Response of the `process` step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
  /// Opaque token for the server-side staged copy of `all_data`.
  pub session_id:       Uuid,
  pub filename:         String,
  pub total_records:    usize,
  pub valid_records:    usize,
  pub duplicates_count: usize,
  pub duplicates:       Vec<DuplicateFlag>,
  pub errors:           Vec<RowParseFailure>,
  /// A fixed-size prefix of `all_data` for display.
  pub sample_data:      Vec<CanonicalMember>,
  pub all_data:         Vec<CanonicalMember>,
  /// SHA-256 (hex) of the serialised `all_data`.
  pub checksum:         String,
}

/// Body of the `import` step.
///
/// Either `session_id` (server-staged batch) or `all_data` (client
/// round-tripped batch) must be given; `session_id` wins when both are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportRequest {
  pub session_id:    Option<Uuid>,
  pub all_data:      Option<Vec<CanonicalMember>>,
  pub filename:      Option<String>,
  #[serde(default)]
  pub excluded_rows: Vec<u32>,
  /// When sent with `all_data`, must equal the `checksum` from `process`.
  pub checksum:      Option<String>,
}
