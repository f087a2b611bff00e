//! Short-lived server-side staging of processed uploads.
//!
//! `process` stages the parsed batch under a fresh session id; `import` takes
//! it back out so the client never has to send the records back. Entries
//! expire after a fixed TTL and can be taken at most once. Nothing here is
//! persisted: a restart forgets every pending session.

use std::{
  collections::HashMap,
  sync::{Mutex, MutexGuard, PoisonError},
  time::{Duration, Instant},
};

use keahlian_core::member::CanonicalMember;
use uuid::Uuid;

/// A processed upload awaiting import.
#[derive(Debug, Clone)]
pub struct StagedUpload {
  pub uploaded_by: String,
  pub filename:    String,
  pub records:     Vec<CanonicalMember>,
  staged_at:       Instant,
}

#[derive(Debug)]
pub struct StagingStore {
  ttl:      Duration,
  sessions: Mutex<HashMap<Uuid, StagedUpload>>,
}

impl StagingStore {
  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl,
      sessions: Mutex::new(HashMap::new()),
    }
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, StagedUpload>> {
    self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn is_expired(&self, staged: &StagedUpload, now: Instant) -> bool {
    now.duration_since(staged.staged_at) >= self.ttl
  }

  /// Stage `records` and return the new session id. Expired sessions are
  /// swept on the way.
  pub fn stage(&self, uploaded_by: &str, filename: &str, records: Vec<CanonicalMember>) -> Uuid {
    let now = Instant::now();
    let id = Uuid::new_v4();
    let mut sessions = self.lock();
    sessions.retain(|_, staged| !self.is_expired(staged, now));
    sessions.insert(id, StagedUpload {
      uploaded_by: uploaded_by.to_owned(),
      filename: filename.to_owned(),
      records,
      staged_at: now,
    });
    id
  }

  /// Remove and return the upload staged under `id` by `uploaded_by`.
  /// Sessions belonging to another caller are reported as absent and left
  /// in place. Once taken, concurrent callers see the session as absent.
  pub fn take(&self, id: Uuid, uploaded_by: &str) -> Option<StagedUpload> {
    let now = Instant::now();
    let mut sessions = self.lock();
    let staged = sessions.get(&id)?;
    if self.is_expired(staged, now) {
      sessions.remove(&id);
      return None;
    }
    if staged.uploaded_by != uploaded_by {
      return None;
    }
    sessions.remove(&id)
  }

  /// Put a taken upload back under its old id, keeping its original
  /// staging time.
  pub fn restore(&self, id: Uuid, staged: StagedUpload) {
    self.lock().entry(id).or_insert(staged);
  }

  /// Number of live (unexpired) sessions.
  pub fn len(&self) -> usize {
    let now = Instant::now();
    self.lock().values().filter(|s| !self.is_expired(s, now)).count()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}
