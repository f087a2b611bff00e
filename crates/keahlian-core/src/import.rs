//! The importer: commits a reviewed batch to a [`MemberStore`].
//!
//! Rows are processed in ascending `source_row`. Each row is validated and
//! written on its own; a bad row is reported and skipped, it never rolls back
//! or aborts the rows around it. Only batch-level problems (missing caller
//! identity, malformed batch, store failure) end the import early.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  Error, Result,
  member::{CanonicalMember, NewMember},
  store::MemberStore,
};

/// Required length of an IC (MyKad) number.
pub const IC_LENGTH: usize = 12;

// ─── Result report ───────────────────────────────────────────────────────────

/// A per-row failure, referenced by `source_row`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
  pub row:   u32,
  pub error: String,
}

/// Outcome of one import call. `total_processed` counts every row that was
/// not excluded, so `successful + failed == total_processed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
  pub successful:      usize,
  pub failed:          usize,
  pub total_processed: usize,
  pub errors:          Vec<RowError>,
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Import-time validation failure for a single row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportValidationError {
  #[error("missing name")]
  MissingName,

  #[error("IC number must be exactly 12 digits (got {0})")]
  IcLength(usize),

  #[error("IC number {0} contains characters other than digits")]
  IcNotDigits(String),

  #[error("phone number {0} is not a valid mobile number (expected 01 followed by 8 or 9 digits)")]
  InvalidPhone(String),
}

/// Stricter checks than the parser applies: name present, IC exactly 12
/// digits when given, phone a local mobile number (`01` + 8-9 digits) when
/// given.
pub fn validate_for_import(
  record: &CanonicalMember,
) -> Result<(), ImportValidationError> {
  if record.name.trim().is_empty() {
    return Err(ImportValidationError::MissingName);
  }

  if let Some(ic) = record.ic_key() {
    if !ic.chars().all(|c| c.is_ascii_digit()) {
      return Err(ImportValidationError::IcNotDigits(ic.to_owned()));
    }
    if ic.len() != IC_LENGTH {
      return Err(ImportValidationError::IcLength(ic.len()));
    }
  }

  if let Some(phone) = record.phone_key()
    && !is_mobile_number(phone)
  {
    return Err(ImportValidationError::InvalidPhone(phone.to_owned()));
  }

  Ok(())
}

/// `^01\d{8,9}$`
pub fn is_mobile_number(phone: &str) -> bool {
  phone.starts_with("01")
    && (10..=11).contains(&phone.len())
    && phone.bytes().all(|b| b.is_ascii_digit())
}

// ─── Import ──────────────────────────────────────────────────────────────────

/// Import `records`, skipping every row whose `source_row` is in
/// `excluded_rows`.
///
/// Rows already written stay written even if a later store call fails; that
/// failure is returned as [`Error::Store`] instead of a report.
pub async fn import_batch<S>(
  store: &S,
  records: &[CanonicalMember],
  excluded_rows: &BTreeSet<u32>,
  uploaded_by: &str,
  source_file: &str,
) -> Result<ImportResult>
where
  S: MemberStore,
{
  let uploaded_by = uploaded_by.trim();
  if uploaded_by.is_empty() {
    return Err(Error::MissingIdentity);
  }

  let mut ordered: Vec<&CanonicalMember> = records.iter().collect();
  ordered.sort_by_key(|r| r.source_row);
  if let Some(pair) = ordered
    .windows(2)
    .find(|pair| pair[0].source_row == pair[1].source_row)
  {
    return Err(Error::DuplicateSourceRow(pair[0].source_row));
  }

  let mut result = ImportResult::default();

  for record in ordered {
    if excluded_rows.contains(&record.source_row) {
      continue;
    }

    if let Err(e) = validate_for_import(record) {
      tracing::debug!(row = record.source_row, error = %e, "row rejected at import");
      result.failed += 1;
      result.errors.push(RowError {
        row:   record.source_row,
        error: e.to_string(),
      });
      continue;
    }

    store
      .insert_member(NewMember {
        record:      record.clone(),
        uploaded_by: uploaded_by.to_owned(),
        source_file: source_file.to_owned(),
      })
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    result.successful += 1;
  }

  result.total_processed = result.successful + result.failed;

  tracing::info!(
    source_file,
    uploaded_by,
    successful = result.successful,
    failed = result.failed,
    excluded = records.len() - result.total_processed,
    "member import finished"
  );

  Ok(result)
}
