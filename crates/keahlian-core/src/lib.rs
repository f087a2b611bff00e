//! Member records, duplicate detection and the importer for Keahlian.
//!
//! Everything here works on in-memory records and the [`store::MemberStore`]
//! trait. Reading spreadsheets lives in `keahlian-sheet`, persistence in
//! `keahlian-store-sqlite`, and the HTTP surface in `keahlian-api`.

pub mod duplicate;
pub mod error;
pub mod import;
pub mod member;
pub mod store;
pub mod upload;

pub use error::{Error, Result};
