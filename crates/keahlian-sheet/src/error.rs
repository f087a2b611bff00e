//! Error types for the keahlian-sheet codec.
//!
//! Every variant is a file-level format problem: the upload is rejected and
//! nothing is staged. Problems with individual rows are not errors; they are
//! reported as [`keahlian_core::upload::RowParseFailure`]s.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unsupported file type: {0:?} (expected .csv, .xlsx, .xls or .ods)")]
  UnsupportedFormat(String),

  #[error("file contains no header row")]
  Empty,

  #[error("no column could be recognised as the member name (e.g. \"Name\" or \"Nama\")")]
  MissingNameColumn,

  #[error("unreadable CSV: {0}")]
  Csv(#[from] csv::Error),

  #[error("unreadable workbook: {0}")]
  Workbook(#[from] calamine::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
