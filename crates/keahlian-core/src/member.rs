//! Member records: the canonical form every uploaded row is normalised into,
//! and the durable form a record takes once it has been imported.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

// ─── Demographics ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
  M,
  F,
}

impl Gender {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::M => "M",
      Self::F => "F",
    }
  }

  /// Inverse of [`Gender::as_str`].
  pub fn from_code(s: &str) -> Option<Self> {
    match s {
      "M" => Some(Self::M),
      "F" => Some(Self::F),
      _ => None,
    }
  }
}

// ─── CanonicalMember ─────────────────────────────────────────────────────────

/// A normalised spreadsheet row.
///
/// `source_row` is the 1-based position of the row in the uploaded file and is
/// the only handle used for exclusion and error reporting; a record has no
/// database identity until it is imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalMember {
  #[serde(default)]
  pub name:       String,
  /// Digits only. Length is checked at import time, not at parse time.
  #[serde(default)]
  pub ic_no:      String,
  /// Digits only, leading-zero local form where recognisable.
  #[serde(default)]
  pub phone:      String,
  pub email:      Option<String>,
  pub address:    Option<String>,
  pub city:       Option<String>,
  pub state:      Option<String>,
  pub postcode:   Option<String>,
  pub gender:     Option<Gender>,
  pub age:        Option<u32>,
  pub source_row: u32,
}

impl CanonicalMember {
  /// An otherwise-empty record for `source_row`.
  pub fn empty(source_row: u32) -> Self {
    Self {
      name: String::new(),
      ic_no: String::new(),
      phone: String::new(),
      email: None,
      address: None,
      city: None,
      state: None,
      postcode: None,
      gender: None,
      age: None,
      source_row,
    }
  }

  /// Case-folded, trimmed name used for duplicate matching. `None` when the
  /// name is blank.
  pub fn name_key(&self) -> Option<String> {
    let trimmed = self.name.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
  }

  /// `None` when the IC number is blank; blank values never match.
  pub fn ic_key(&self) -> Option<&str> {
    let trimmed = self.ic_no.trim();
    (!trimmed.is_empty()).then_some(trimmed)
  }

  /// `None` when the phone number is blank; blank values never match.
  pub fn phone_key(&self) -> Option<&str> {
    let trimmed = self.phone.trim();
    (!trimmed.is_empty()).then_some(trimmed)
  }
}

// ─── Persisted members ───────────────────────────────────────────────────────

/// Review state of an imported member. New imports are always `Pending`; the
/// approval workflow moves them on.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MemberStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

/// Input to [`crate::store::MemberStore::insert_member`].
/// Identity, status and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMember {
  pub record:      CanonicalMember,
  /// Who ran the import.
  pub uploaded_by: String,
  /// Name of the uploaded file the record came from.
  pub source_file: String,
}

/// A member created by a successful import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedMember {
  pub member_id:   Uuid,
  #[serde(flatten)]
  pub record:      CanonicalMember,
  pub status:      MemberStatus,
  pub uploaded_by: String,
  pub source_file: String,
  pub created_at:  DateTime<Utc>,
  pub reviewed_by: Option<String>,
  pub reviewed_at: Option<DateTime<Utc>>,
}
