//! Row parser: raw spreadsheet cells → [`CanonicalMember`].
//!
//! Parsing is lenient. Every row keeps its `source_row` and whatever fields
//! could be recovered, so the reviewer sees the whole file; the stricter
//! checks happen at import time.

use keahlian_core::{
  member::{CanonicalMember, Gender},
  upload::RowParseFailure,
};

use crate::{
  ParseOptions,
  header::{Field, HeaderMap},
  ic::infer_from_ic,
  postcode::state_for_postcode,
  reader::Sheet,
};

/// One parsed row. `failure` is set when the row cannot count as valid; the
/// member is kept either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
  pub member:  CanonicalMember,
  pub failure: Option<RowParseFailure>,
}

/// Every data row of a sheet plus the rows that failed to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedBatch {
  pub records: Vec<CanonicalMember>,
  pub errors:  Vec<RowParseFailure>,
}

impl ParsedBatch {
  pub fn total_records(&self) -> usize { self.records.len() }

  pub fn valid_records(&self) -> usize { self.records.len() - self.errors.len() }
}

/// Parse every non-blank data row of `sheet`. A row's `source_row` is its
/// position in the file, so skipping blank rows leaves gaps in the numbering.
pub fn parse_rows(sheet: &Sheet, headers: &HeaderMap, options: &ParseOptions) -> ParsedBatch {
  let mut batch = ParsedBatch::default();

  for (index, cells) in sheet.rows.iter().enumerate() {
    if cells.iter().all(|c| c.trim().is_empty()) {
      continue;
    }
    let source_row = u32::try_from(index + 1).unwrap_or(u32::MAX);
    let parsed = parse_row(cells, headers, source_row, options);
    if let Some(failure) = parsed.failure {
      batch.errors.push(failure);
    }
    batch.records.push(parsed.member);
  }

  batch
}

/// Parse one row of cells.
pub fn parse_row(
  cells: &[String],
  headers: &HeaderMap,
  source_row: u32,
  options: &ParseOptions,
) -> ParsedRow {
  let cell = |field: Field| {
    headers
      .column(field)
      .and_then(|i| cells.get(i))
      .map(|s| s.trim())
      .filter(|s| !s.is_empty())
  };

  let ic_no = cell(Field::IcNo).map(digits_only).unwrap_or_default();
  let postcode = cell(Field::Postcode).map(normalize_postcode);
  let state = cell(Field::State)
    .map(str::to_owned)
    .or_else(|| postcode.as_deref().and_then(state_for_postcode).map(str::to_owned));

  let mut gender = cell(Field::Gender).and_then(parse_gender);
  let mut age = cell(Field::Age).and_then(parse_age);
  if options.infer_demographics && (gender.is_none() || age.is_none()) {
    let inferred = infer_from_ic(&ic_no, options.today);
    gender = gender.or(inferred.gender);
    age = age.or(inferred.age);
  }

  let member = CanonicalMember {
    name: cell(Field::Name).unwrap_or_default().to_owned(),
    ic_no,
    phone: cell(Field::Phone).map(normalize_phone).unwrap_or_default(),
    email: cell(Field::Email).map(str::to_lowercase),
    address: cell(Field::Address).map(str::to_owned),
    city: cell(Field::City).map(str::to_owned),
    state,
    postcode,
    gender,
    age,
    source_row,
  };

  let failure = member.name.is_empty().then(|| RowParseFailure {
    row:    source_row,
    reason: "missing name".to_owned(),
  });

  ParsedRow { member, failure }
}

// ─── Field cleanup ───────────────────────────────────────────────────────────

fn digits_only(s: &str) -> String { s.chars().filter(char::is_ascii_digit).collect() }

/// Strip to digits and bring the number into local leading-zero form where
/// that is unambiguous: `+60 12-345 6789` → `0123456789`, and a mobile
/// number whose leading zero was eaten by a numeric cell gets it back.
/// Anything else is left as digits for import-time validation to judge.
pub fn normalize_phone(raw: &str) -> String {
  let digits = digits_only(raw);
  if let Some(rest) = digits.strip_prefix("60")
    && rest.starts_with('1')
  {
    return format!("0{rest}");
  }
  if digits.starts_with('1') && (9..=10).contains(&digits.len()) {
    return format!("0{digits}");
  }
  digits
}

/// Restore a leading zero lost by a numeric cell (`1000` → `01000`).
fn normalize_postcode(raw: &str) -> String {
  if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
    format!("0{raw}")
  } else {
    raw.to_owned()
  }
}

fn parse_gender(raw: &str) -> Option<Gender> {
  match raw.to_lowercase().as_str() {
    "m" | "male" | "l" | "lelaki" => Some(Gender::M),
    "f" | "female" | "p" | "perempuan" => Some(Gender::F),
    _ => None,
  }
}

/// A non-negative whole number, else `None` (never zero by default).
fn parse_age(raw: &str) -> Option<u32> { raw.parse().ok() }
