//! The `MemberStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `keahlian-store-sqlite`).
//! The import pipeline and the HTTP layer depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  duplicate::MatchKeys,
  member::{MemberStatus, NewMember, PersistedMember},
};

/// Abstraction over a member store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait MemberStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return every persisted member whose name key, IC number or phone number
  /// appears in `keys`, ordered by creation time.
  fn find_matching<'a>(
    &'a self,
    keys: &'a MatchKeys,
  ) -> impl Future<Output = Result<Vec<PersistedMember>, Self::Error>> + Send + 'a;

  /// Persist a new member with `Pending` status.
  fn insert_member(
    &self,
    input: NewMember,
  ) -> impl Future<Output = Result<PersistedMember, Self::Error>> + Send + '_;

  /// Retrieve a member by id. Returns `None` if not found.
  fn get_member(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<PersistedMember>, Self::Error>> + Send + '_;

  /// List members in creation order, optionally filtered by status.
  fn list_members(
    &self,
    status: Option<MemberStatus>,
  ) -> impl Future<Output = Result<Vec<PersistedMember>, Self::Error>> + Send + '_;

  /// Record a review decision on a pending member. The status check and the
  /// write are one atomic step. Returns the updated member, or `None` if the
  /// id is unknown or the member is no longer pending.
  fn set_status(
    &self,
    id: Uuid,
    status: MemberStatus,
    reviewed_by: String,
  ) -> impl Future<Output = Result<Option<PersistedMember>, Self::Error>> + Send + '_;
}
