//! Handlers for the two-step member upload.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/members/upload/process` | multipart field `file`; parses and flags duplicates, writes nothing |
//! | `POST` | `/members/upload/import`  | Body: [`ImportRequest`]; commits the staged batch |

use std::collections::BTreeSet;

use axum::{
  Json,
  extract::{Multipart, State},
};
use bytes::Bytes;
use keahlian_core::{
  duplicate::{MatchKeys, detect},
  import::{ImportResult, import_batch},
  member::CanonicalMember,
  store::MemberStore,
  upload::{ImportRequest, ProcessResponse},
};
use sha2::{Digest, Sha256};

use crate::{ApiState, error::ApiError, identity::CallerIdentity};

/// Name of the multipart field carrying the spreadsheet.
pub const FILE_FIELD: &str = "file";

/// Hex SHA-256 of the JSON encoding of `records`; lets `import` detect a
/// batch the client changed after `process`.
pub fn batch_checksum(records: &[CanonicalMember]) -> Result<String, serde_json::Error> {
  let encoded = serde_json::to_vec(records)?;
  Ok(hex::encode(Sha256::digest(&encoded)))
}

async fn read_upload(mut multipart: Multipart) -> Result<(String, Bytes), ApiError> {
  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| ApiError::BadRequest(e.body_text()))?
  {
    if field.name() != Some(FILE_FIELD) {
      continue;
    }
    let filename = field
      .file_name()
      .map(str::to_owned)
      .ok_or_else(|| ApiError::BadRequest("uploaded file has no filename".to_string()))?;
    let data = field
      .bytes()
      .await
      .map_err(|e| ApiError::BadRequest(e.body_text()))?;
    return Ok((filename, data));
  }
  Err(ApiError::BadRequest(format!("missing multipart field `{FILE_FIELD}`")))
}

// ─── Process ─────────────────────────────────────────────────────────────────

/// `POST /members/upload/process`
pub async fn process<S>(
  State(state): State<ApiState<S>>,
  CallerIdentity(caller): CallerIdentity,
  multipart: Multipart,
) -> Result<Json<ProcessResponse>, ApiError>
where
  S: MemberStore,
{
  let (filename, data) = read_upload(multipart).await?;
  let batch = keahlian_sheet::parse_file(&data, &filename, &state.settings.parse_options())?;

  let existing = state
    .store
    .find_matching(&MatchKeys::from_records(&batch.records))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let duplicates = detect(&batch.records, &existing);

  let checksum = batch_checksum(&batch.records)?;
  let session_id = state
    .sessions
    .stage(&caller, &filename, batch.records.clone());

  tracing::info!(
    %session_id,
    filename = %filename,
    uploaded_by = %caller,
    total = batch.total_records(),
    valid = batch.valid_records(),
    duplicates = duplicates.len(),
    "processed member upload"
  );

  let sample_data = batch
    .records
    .iter()
    .take(state.settings.sample_size)
    .cloned()
    .collect();

  Ok(Json(ProcessResponse {
    session_id,
    total_records: batch.total_records(),
    valid_records: batch.valid_records(),
    duplicates_count: duplicates.len(),
    duplicates,
    errors: batch.errors,
    sample_data,
    all_data: batch.records,
    checksum,
    filename,
  }))
}

// ─── Import ──────────────────────────────────────────────────────────────────

/// `POST /members/upload/import`
///
/// A staged session takes precedence over `all_data`. The session is taken
/// out of the staging store before any write, so overlapping imports of the
/// same session commit it once; a fatal import error puts it back.
pub async fn import<S>(
  State(state): State<ApiState<S>>,
  CallerIdentity(caller): CallerIdentity,
  Json(body): Json<ImportRequest>,
) -> Result<Json<ImportResult>, ApiError>
where
  S: MemberStore,
{
  let excluded: BTreeSet<u32> = body.excluded_rows.iter().copied().collect();

  let Some(id) = body.session_id else {
    let all_data = body.all_data.ok_or_else(|| {
      ApiError::BadRequest("either session_id or all_data is required".to_string())
    })?;
    if let Some(expected) = &body.checksum
      && batch_checksum(&all_data)? != *expected
    {
      return Err(ApiError::BadRequest(
        "all_data does not match the checksum returned by process".to_string(),
      ));
    }
    let filename = body
      .filename
      .ok_or_else(|| ApiError::BadRequest("filename is required".to_string()))?;
    let result = import_batch(&*state.store, &all_data, &excluded, &caller, &filename).await?;
    return Ok(Json(result));
  };

  let staged = state
    .sessions
    .take(id, &caller)
    .ok_or_else(|| ApiError::NotFound(format!("upload session {id} not found or expired")))?;
  let filename = body.filename.unwrap_or_else(|| staged.filename.clone());

  match import_batch(&*state.store, &staged.records, &excluded, &caller, &filename).await {
    Ok(result) => Ok(Json(result)),
    Err(e) => {
      state.sessions.restore(id, staged);
      Err(e.into())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn checksum_changes_with_content() {
    let mut ali = CanonicalMember::empty(1);
    ali.name = "Ali".into();
    let original = vec![ali.clone()];

    let mut edited = ali;
    edited.phone = "0123456789".into();

    let a = batch_checksum(&original).unwrap();
    assert_eq!(a.len(), 64);
    assert_eq!(a, batch_checksum(&original).unwrap());
    assert_ne!(a, batch_checksum(&[edited]).unwrap());
  }
}
