//! Member spreadsheet codec for Keahlian.
//!
//! Converts an uploaded CSV or Excel file into [`keahlian_core`] member
//! records. Pure synchronous; no HTTP or database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use keahlian_sheet::{ParseOptions, parse_file};
//!
//! let csv = b"Nama,No IC,Telefon\nAli,880101-14-5567,012-3456789\n";
//! let batch = parse_file(csv, "ahli.csv", &ParseOptions::default()).unwrap();
//! println!("{} rows, {} valid", batch.total_records(), batch.valid_records());
//! ```

pub mod error;
pub mod header;
pub mod ic;
pub mod postcode;
pub mod reader;
pub mod row;

use chrono::{NaiveDate, Utc};

pub use error::{Error, Result};
pub use header::HeaderMap;
pub use reader::{Sheet, read_sheet};
pub use row::{ParsedBatch, parse_rows};

// ─── Options ─────────────────────────────────────────────────────────────────

/// Deployment-level parsing switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
  /// Fill missing gender and age from the IC number.
  pub infer_demographics: bool,
  /// Reference date for age calculation.
  pub today:              NaiveDate,
}

impl Default for ParseOptions {
  fn default() -> Self {
    Self {
      infer_demographics: true,
      today:              Utc::now().date_naive(),
    }
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Read, map headers and parse every row of an uploaded file.
///
/// Fails only for file-level problems (unsupported or unreadable file, no
/// name column); row problems are listed in [`ParsedBatch::errors`].
pub fn parse_file(bytes: &[u8], filename: &str, options: &ParseOptions) -> Result<ParsedBatch> {
  let sheet = read_sheet(bytes, filename)?;
  let headers = HeaderMap::from_headers(&sheet.headers)?;
  let batch = parse_rows(&sheet, &headers, options);

  tracing::debug!(
    filename,
    columns = ?headers.fields().collect::<Vec<_>>(),
    total = batch.total_records(),
    invalid = batch.errors.len(),
    "parsed member sheet"
  );

  Ok(batch)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn options() -> ParseOptions {
    ParseOptions {
      infer_demographics: true,
      today:              NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
    }
  }

  #[test]
  fn total_records_excludes_header() {
    let csv = "Name,IC,Phone\nAli,123456789012,0123456789\nAli,123456789012,\nBob,999999999999,\n";
    let batch = parse_file(csv.as_bytes(), "batch.csv", &options()).unwrap();
    assert_eq!(batch.total_records(), 3);
    assert_eq!(batch.valid_records(), 3);
    let rows: Vec<u32> = batch.records.iter().map(|r| r.source_row).collect();
    assert_eq!(rows, vec![1, 2, 3]);
  }

  #[test]
  fn blank_lines_leave_gaps_in_row_numbers() {
    for csv in ["Name\nAli\n\nBob\n", "Name\nAli\n,\nBob\n"] {
      let batch = parse_file(csv.as_bytes(), "batch.csv", &options()).unwrap();
      let rows: Vec<(&str, u32)> = batch
        .records
        .iter()
        .map(|r| (r.name.as_str(), r.source_row))
        .collect();
      assert_eq!(rows, vec![("Ali", 1), ("Bob", 3)], "input {csv:?}");
    }
  }

  #[test]
  fn invalid_rows_stay_in_the_batch() {
    let csv = "Nama,Telefon\n,0123456789\nSiti,019-888 7777\n";
    let batch = parse_file(csv.as_bytes(), "batch.csv", &options()).unwrap();
    assert_eq!(batch.total_records(), 2);
    assert_eq!(batch.valid_records(), 1);
    assert_eq!(batch.errors[0].row, 1);
    assert_eq!(batch.records[1].phone, "0198887777");
  }

  #[test]
  fn file_without_name_column_is_rejected() {
    let csv = "IC,Phone\n123456789012,0123456789\n";
    let err = parse_file(csv.as_bytes(), "batch.csv", &options()).unwrap_err();
    assert!(matches!(err, Error::MissingNameColumn));
  }

  #[test]
  fn parsing_is_repeatable() {
    let csv = "Name,IC\nAli,850312145671\nBob,12345\n";
    let first = parse_file(csv.as_bytes(), "a.csv", &options()).unwrap();
    let second = parse_file(csv.as_bytes(), "a.csv", &options()).unwrap();
    assert_eq!(first, second);
  }
}
