//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Status and gender use their short string
//! codes.

use std::str::FromStr as _;

use chrono::{DateTime, Utc};
use keahlian_core::member::{CanonicalMember, Gender, MemberStatus, PersistedMember};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── MemberStatus ────────────────────────────────────────────────────────────

pub fn encode_status(status: MemberStatus) -> &'static str { status.into() }

pub fn decode_status(s: &str) -> Result<MemberStatus> {
  MemberStatus::from_str(s).map_err(|_| Error::Decode(format!("unknown status: {s:?}")))
}

// ─── Gender ──────────────────────────────────────────────────────────────────

pub fn decode_gender(s: &str) -> Result<Gender> {
  Gender::from_code(s).ok_or_else(|| Error::Decode(format!("unknown gender: {s:?}")))
}

// ─── Row type ────────────────────────────────────────────────────────────────

/// Column list matching [`RawMember::from_row`].
pub const MEMBER_COLUMNS: &str = "member_id, name, ic_no, phone, email, address, city, state, \
                                  postcode, gender, age, status, uploaded_by, source_file, \
                                  source_row, created_at, reviewed_by, reviewed_at";

/// Raw values read directly from a `members` row.
pub struct RawMember {
  pub member_id:   String,
  pub name:        String,
  pub ic_no:       String,
  pub phone:       String,
  pub email:       Option<String>,
  pub address:     Option<String>,
  pub city:        Option<String>,
  pub state:       Option<String>,
  pub postcode:    Option<String>,
  pub gender:      Option<String>,
  pub age:         Option<i64>,
  pub status:      String,
  pub uploaded_by: String,
  pub source_file: String,
  pub source_row:  i64,
  pub created_at:  String,
  pub reviewed_by: Option<String>,
  pub reviewed_at: Option<String>,
}

impl RawMember {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      member_id:   row.get(0)?,
      name:        row.get(1)?,
      ic_no:       row.get(2)?,
      phone:       row.get(3)?,
      email:       row.get(4)?,
      address:     row.get(5)?,
      city:        row.get(6)?,
      state:       row.get(7)?,
      postcode:    row.get(8)?,
      gender:      row.get(9)?,
      age:         row.get(10)?,
      status:      row.get(11)?,
      uploaded_by: row.get(12)?,
      source_file: row.get(13)?,
      source_row:  row.get(14)?,
      created_at:  row.get(15)?,
      reviewed_by: row.get(16)?,
      reviewed_at: row.get(17)?,
    })
  }

  pub fn into_member(self) -> Result<PersistedMember> {
    let record = CanonicalMember {
      name:       self.name,
      ic_no:      self.ic_no,
      phone:      self.phone,
      email:      self.email,
      address:    self.address,
      city:       self.city,
      state:      self.state,
      postcode:   self.postcode,
      gender:     self.gender.as_deref().map(decode_gender).transpose()?,
      age:        self
        .age
        .map(|a| u32::try_from(a).map_err(|_| Error::Decode(format!("invalid age: {a}"))))
        .transpose()?,
      source_row: u32::try_from(self.source_row)
        .map_err(|_| Error::Decode(format!("invalid source_row: {}", self.source_row)))?,
    };

    Ok(PersistedMember {
      member_id: decode_uuid(&self.member_id)?,
      record,
      status: decode_status(&self.status)?,
      uploaded_by: self.uploaded_by,
      source_file: self.source_file,
      created_at: decode_dt(&self.created_at)?,
      reviewed_by: self.reviewed_by,
      reviewed_at: self.reviewed_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}
