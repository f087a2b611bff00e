//! Error types for `keahlian-core`.

use thiserror::Error;

/// A batch-level failure. Problems with individual rows never surface here;
/// they are reported inside [`crate::import::ImportResult`].
#[derive(Debug, Error)]
pub enum Error {
  #[error("caller identity is missing")]
  MissingIdentity,

  #[error("source row {0} appears more than once in the batch")]
  DuplicateSourceRow(u32),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
