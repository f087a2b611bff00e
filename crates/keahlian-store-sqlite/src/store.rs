//! [`SqliteStore`], the SQLite implementation of [`MemberStore`].

use std::{collections::HashSet, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use keahlian_core::{
  duplicate::MatchKeys,
  member::{MemberStatus, NewMember, PersistedMember},
  store::MemberStore,
};

use crate::{
  Result,
  encode::{MEMBER_COLUMNS, RawMember, encode_dt, encode_status, encode_uuid},
  schema::SCHEMA,
};

/// Upper bound on bound parameters per lookup query; well below SQLite's
/// variable limit.
const LOOKUP_CHUNK: usize = 500;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Keahlian member store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── MemberStore impl ────────────────────────────────────────────────────────

impl MemberStore for SqliteStore {
  type Error = crate::Error;

  async fn find_matching(&self, keys: &MatchKeys) -> Result<Vec<PersistedMember>> {
    if keys.is_empty() {
      return Ok(Vec::new());
    }

    let lookups: [(&'static str, Vec<String>); 3] = [
      ("name_key", keys.names.clone()),
      ("ic_no", keys.ic_nos.clone()),
      ("phone", keys.phones.clone()),
    ];

    let raws: Vec<RawMember> = self
      .conn
      .call(move |conn| {
        let mut seen: HashSet<String> = HashSet::new();
        let mut found = Vec::new();

        for (column, values) in &lookups {
          for chunk in values.chunks(LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
              "SELECT {MEMBER_COLUMNS} FROM members WHERE {column} IN ({placeholders})"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(chunk.iter()), RawMember::from_row)?;
            for raw in rows {
              let raw = raw?;
              if seen.insert(raw.member_id.clone()) {
                found.push(raw);
              }
            }
          }
        }

        Ok(found)
      })
      .await?;

    let mut members = raws
      .into_iter()
      .map(RawMember::into_member)
      .collect::<Result<Vec<_>>>()?;
    members.sort_by(|a, b| {
      a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.member_id.cmp(&b.member_id))
    });
    Ok(members)
  }

  async fn insert_member(&self, input: NewMember) -> Result<PersistedMember> {
    let member = PersistedMember {
      member_id:   Uuid::new_v4(),
      record:      input.record,
      status:      MemberStatus::Pending,
      uploaded_by: input.uploaded_by,
      source_file: input.source_file,
      created_at:  Utc::now(),
      reviewed_by: None,
      reviewed_at: None,
    };

    let record       = member.record.clone();
    let id_str       = encode_uuid(member.member_id);
    let name_key     = record.name_key().unwrap_or_default();
    let gender_str   = record.gender.map(|g| g.as_str());
    let age          = record.age.map(i64::from);
    let status_str   = encode_status(member.status);
    let uploaded_by  = member.uploaded_by.clone();
    let source_file  = member.source_file.clone();
    let source_row   = i64::from(record.source_row);
    let created_str  = encode_dt(member.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO members (
             member_id, name, name_key, ic_no, phone, email, address, city,
             state, postcode, gender, age, status, uploaded_by, source_file,
             source_row, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
          rusqlite::params![
            id_str,
            record.name,
            name_key,
            record.ic_no,
            record.phone,
            record.email,
            record.address,
            record.city,
            record.state,
            record.postcode,
            gender_str,
            age,
            status_str,
            uploaded_by,
            source_file,
            source_row,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(member)
  }

  async fn get_member(&self, id: Uuid) -> Result<Option<PersistedMember>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawMember> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE member_id = ?1"),
            rusqlite::params![id_str],
            RawMember::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawMember::into_member).transpose()
  }

  async fn list_members(&self, status: Option<MemberStatus>) -> Result<Vec<PersistedMember>> {
    let status_str = status.map(encode_status);

    let raws: Vec<RawMember> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(s) = status_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE status = ?1
             ORDER BY created_at, member_id"
          ))?;
          stmt
            .query_map(rusqlite::params![s], RawMember::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members ORDER BY created_at, member_id"
          ))?;
          stmt
            .query_map([], RawMember::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMember::into_member).collect()
  }

  async fn set_status(
    &self,
    id:          Uuid,
    status:      MemberStatus,
    reviewed_by: String,
  ) -> Result<Option<PersistedMember>> {
    let id_str      = encode_uuid(id);
    let status_str  = encode_status(status);
    let pending_str = encode_status(MemberStatus::Pending);
    let at_str      = encode_dt(Utc::now());

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE members SET status = ?1, reviewed_by = ?2, reviewed_at = ?3
           WHERE member_id = ?4 AND status = ?5",
          rusqlite::params![status_str, reviewed_by, at_str, id_str, pending_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_member(id).await
  }
}
