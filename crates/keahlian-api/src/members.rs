//! Handlers for `/members` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/members` | Optional `?status=pending\|approved\|rejected` |
//! | `GET`  | `/members/:id` | 404 if not found |
//! | `POST` | `/members/:id/approve` | 409 unless pending |
//! | `POST` | `/members/:id/reject` | 409 unless pending |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use keahlian_core::{
  member::{MemberStatus, PersistedMember},
  store::MemberStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError, identity::CallerIdentity};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<MemberStatus>,
}

/// `GET /members[?status=<status>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<PersistedMember>>, ApiError>
where
  S: MemberStore,
{
  let members = state
    .store
    .list_members(params.status)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(members))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /members/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<PersistedMember>, ApiError>
where
  S: MemberStore,
{
  let member = state
    .store
    .get_member(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("member {id} not found")))?;
  Ok(Json(member))
}

// ─── Review ───────────────────────────────────────────────────────────────────

/// `POST /members/:id/approve`
pub async fn approve<S>(
  State(state): State<ApiState<S>>,
  caller: CallerIdentity,
  Path(id): Path<Uuid>,
) -> Result<Json<PersistedMember>, ApiError>
where
  S: MemberStore,
{
  review(&state, caller, id, MemberStatus::Approved).await
}

/// `POST /members/:id/reject`
pub async fn reject<S>(
  State(state): State<ApiState<S>>,
  caller: CallerIdentity,
  Path(id): Path<Uuid>,
) -> Result<Json<PersistedMember>, ApiError>
where
  S: MemberStore,
{
  review(&state, caller, id, MemberStatus::Rejected).await
}

async fn review<S>(
  state: &ApiState<S>,
  CallerIdentity(caller): CallerIdentity,
  id: Uuid,
  decision: MemberStatus,
) -> Result<Json<PersistedMember>, ApiError>
where
  S: MemberStore,
{
  let updated = state
    .store
    .set_status(id, decision, caller.clone())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let Some(updated) = updated else {
    // Either unknown, or another review got there first.
    let current = state
      .store
      .get_member(id)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?
      .ok_or_else(|| ApiError::NotFound(format!("member {id} not found")))?;
    return Err(ApiError::Conflict(format!(
      "member {id} is already {}",
      current.status
    )));
  };

  tracing::info!(member_id = %id, status = %decision, reviewed_by = %caller, "member reviewed");
  Ok(Json(updated))
}
