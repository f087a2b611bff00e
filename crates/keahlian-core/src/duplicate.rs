//! Duplicate detection for an uploaded batch.
//!
//! A record is a duplicate when its name (case-insensitive), IC number or
//! phone number equals that of an already-persisted member or of another row
//! in the same batch. Blank values never match. Both sides are indexed by
//! each key before scanning, so a batch is checked in roughly linear time.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::member::{CanonicalMember, MemberStatus, PersistedMember};

// ─── Output types ────────────────────────────────────────────────────────────

/// The field on which two records collided.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
  Name,
  Ic,
  Phone,
}

/// A collision with an already-persisted member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseMatch {
  pub member_id:  Uuid,
  pub name:       String,
  pub ic_no:      String,
  pub phone:      String,
  pub status:     MemberStatus,
  pub matched_on: Vec<MatchField>,
}

/// A collision with another row of the same upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMatch {
  /// `source_row` of the other record.
  pub row:        u32,
  pub name:       String,
  pub matched_on: Vec<MatchField>,
}

/// Duplicate annotations for one record. Never produced with both lists
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateFlag {
  pub row:                 u32,
  pub name:                String,
  pub database_duplicates: Vec<DatabaseMatch>,
  pub import_duplicates:   Vec<ImportMatch>,
}

// ─── Store lookup keys ───────────────────────────────────────────────────────

/// The distinct non-blank keys of a batch, used to fetch the persisted
/// members that could possibly collide with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchKeys {
  /// Case-folded names (see [`CanonicalMember::name_key`]).
  pub names:  Vec<String>,
  pub ic_nos: Vec<String>,
  pub phones: Vec<String>,
}

impl MatchKeys {
  pub fn from_records(records: &[CanonicalMember]) -> Self {
    let mut names = BTreeSet::new();
    let mut ic_nos = BTreeSet::new();
    let mut phones = BTreeSet::new();

    for record in records {
      if let Some(name) = record.name_key() {
        names.insert(name);
      }
      if let Some(ic) = record.ic_key() {
        ic_nos.insert(ic.to_owned());
      }
      if let Some(phone) = record.phone_key() {
        phones.insert(phone.to_owned());
      }
    }

    Self {
      names:  names.into_iter().collect(),
      ic_nos: ic_nos.into_iter().collect(),
      phones: phones.into_iter().collect(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty() && self.ic_nos.is_empty() && self.phones.is_empty()
  }
}

// ─── Index ───────────────────────────────────────────────────────────────────

/// Positions of records bucketed by each match key.
#[derive(Default)]
struct KeyIndex {
  name:  HashMap<String, Vec<usize>>,
  ic:    HashMap<String, Vec<usize>>,
  phone: HashMap<String, Vec<usize>>,
}

impl KeyIndex {
  fn build<'a>(records: impl Iterator<Item = &'a CanonicalMember>) -> Self {
    let mut index = Self::default();
    for (pos, record) in records.enumerate() {
      if let Some(name) = record.name_key() {
        index.name.entry(name).or_default().push(pos);
      }
      if let Some(ic) = record.ic_key() {
        index.ic.entry(ic.to_owned()).or_default().push(pos);
      }
      if let Some(phone) = record.phone_key() {
        index.phone.entry(phone.to_owned()).or_default().push(pos);
      }
    }
    index
  }

  /// Every indexed position colliding with `record`, with the fields it
  /// collided on (in `Name`, `Ic`, `Phone` order).
  fn lookup(&self, record: &CanonicalMember) -> BTreeMap<usize, Vec<MatchField>> {
    let mut hits: BTreeMap<usize, Vec<MatchField>> = BTreeMap::new();

    let buckets = [
      (MatchField::Name, record.name_key().and_then(|k| self.name.get(&k))),
      (MatchField::Ic, record.ic_key().and_then(|k| self.ic.get(k))),
      (MatchField::Phone, record.phone_key().and_then(|k| self.phone.get(k))),
    ];

    for (field, bucket) in buckets {
      for &pos in bucket.into_iter().flatten() {
        hits.entry(pos).or_default().push(field);
      }
    }
    hits
  }
}

// ─── Detection ───────────────────────────────────────────────────────────────

/// Flag every record in `records` that collides with a member in `existing`
/// or with another record of the batch.
///
/// Batch collisions are symmetric: if row A lists row B, row B lists row A.
/// Flags are returned in ascending `source_row`.
pub fn detect(
  records: &[CanonicalMember],
  existing: &[PersistedMember],
) -> Vec<DuplicateFlag> {
  let existing_index = KeyIndex::build(existing.iter().map(|m| &m.record));
  let batch_index = KeyIndex::build(records.iter());

  let mut flags: Vec<DuplicateFlag> = records
    .iter()
    .enumerate()
    .filter_map(|(pos, record)| {
      let database_duplicates: Vec<DatabaseMatch> = existing_index
        .lookup(record)
        .into_iter()
        .map(|(other, matched_on)| {
          let member = &existing[other];
          DatabaseMatch {
            member_id: member.member_id,
            name: member.record.name.clone(),
            ic_no: member.record.ic_no.clone(),
            phone: member.record.phone.clone(),
            status: member.status,
            matched_on,
          }
        })
        .collect();

      let mut import_duplicates: Vec<ImportMatch> = batch_index
        .lookup(record)
        .into_iter()
        .filter(|(other, _)| *other != pos)
        .map(|(other, matched_on)| ImportMatch {
          row: records[other].source_row,
          name: records[other].name.clone(),
          matched_on,
        })
        .collect();
      import_duplicates.sort_by_key(|m| m.row);

      if database_duplicates.is_empty() && import_duplicates.is_empty() {
        return None;
      }

      Some(DuplicateFlag {
        row: record.source_row,
        name: record.name.clone(),
        database_duplicates,
        import_duplicates,
      })
    })
    .collect();

  flags.sort_by_key(|f| f.row);
  flags
}
