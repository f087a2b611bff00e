//! Bilingual (English / Malay) column-header recognition.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// A canonical member field a spreadsheet column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
  Name,
  IcNo,
  Phone,
  Email,
  Address,
  City,
  State,
  Postcode,
  Gender,
  Age,
}

/// Recognised headers per field, already in [`normalize_header`] form.
const SYNONYMS: &[(Field, &[&str])] = &[
  (Field::Name, &["name", "full name", "member name", "nama", "nama penuh", "nama ahli"]),
  (
    Field::IcNo,
    &[
      "ic",
      "nric",
      "ic number",
      "ic no",
      "nric no",
      "identity card",
      "kad pengenalan",
      "no kad pengenalan",
      "no ic",
      "mykad",
    ],
  ),
  (
    Field::Phone,
    &[
      "phone",
      "mobile",
      "phone number",
      "mobile number",
      "phone no",
      "tel",
      "telefon",
      "no telefon",
      "no tel",
      "no phone",
      "handphone",
      "no handphone",
    ],
  ),
  (Field::Email, &["email", "email address", "e mail", "emel", "e mel"]),
  (Field::Address, &["address", "home address", "alamat"]),
  (Field::City, &["city", "town", "bandar"]),
  (Field::State, &["state", "negeri"]),
  (Field::Postcode, &["postcode", "poskod", "postal code", "zip", "zip code"]),
  (Field::Gender, &["gender", "sex", "jantina"]),
  (Field::Age, &["age", "umur"]),
];

/// Case-fold, turn anything but letters and digits into spaces, trim and
/// collapse whitespace.
///
/// `"  No. Kad_Pengenalan "` → `"no kad pengenalan"`.
pub fn normalize_header(raw: &str) -> String {
  raw
    .chars()
    .map(|c| if c.is_alphanumeric() { c } else { ' ' })
    .collect::<String>()
    .to_lowercase()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// The canonical field a raw header denotes, if any.
pub fn field_for_header(raw: &str) -> Option<Field> {
  let normalized = normalize_header(raw);
  SYNONYMS
    .iter()
    .find(|(_, names)| names.contains(&normalized.as_str()))
    .map(|(field, _)| *field)
}

/// Column index for each recognised canonical field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
  columns: BTreeMap<Field, usize>,
}

impl HeaderMap {
  /// Map the header row of a sheet. Unrecognised columns are ignored; when
  /// two columns denote the same field the first one wins.
  ///
  /// Fails with [`Error::MissingNameColumn`] when nothing maps to the name.
  pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Result<Self> {
    let mut columns = BTreeMap::new();
    for (index, header) in headers.iter().enumerate() {
      if let Some(field) = field_for_header(header.as_ref()) {
        columns.entry(field).or_insert(index);
      }
    }

    if !columns.contains_key(&Field::Name) {
      return Err(Error::MissingNameColumn);
    }
    Ok(Self { columns })
  }

  pub fn column(&self, field: Field) -> Option<usize> { self.columns.get(&field).copied() }

  /// Recognised fields in canonical order.
  pub fn fields(&self) -> impl Iterator<Item = Field> + '_ { self.columns.keys().copied() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn english_headers() {
    let map = HeaderMap::from_headers(&["Full Name", "NRIC", "Mobile", "Email Address"]).unwrap();
    assert_eq!(map.column(Field::Name), Some(0));
    assert_eq!(map.column(Field::IcNo), Some(1));
    assert_eq!(map.column(Field::Phone), Some(2));
    assert_eq!(map.column(Field::Email), Some(3));
    assert_eq!(map.column(Field::City), None);
  }

  #[test]
  fn malay_headers() {
    let map = HeaderMap::from_headers(&[
      "Nama",
      "Kad Pengenalan",
      "No Telefon",
      "Emel",
      "Alamat",
      "Bandar",
      "Negeri",
      "Poskod",
    ])
    .unwrap();
    let fields: Vec<Field> = map.fields().collect();
    assert_eq!(
      fields,
      vec![
        Field::Name,
        Field::IcNo,
        Field::Phone,
        Field::Email,
        Field::Address,
        Field::City,
        Field::State,
        Field::Postcode,
      ]
    );
  }

  #[test]
  fn whitespace_and_punctuation_tolerant() {
    assert_eq!(normalize_header("  No.  IC "), "no ic");
    assert_eq!(field_for_header("NO_TELEFON"), Some(Field::Phone));
    assert_eq!(field_for_header("E-mail"), Some(Field::Email));
    assert_eq!(field_for_header("Member   Name:"), Some(Field::Name));
    assert_eq!(field_for_header("IC Number (MyKad)"), None);
  }

  #[test]
  fn required_column_markers_are_ignored() {
    assert_eq!(field_for_header("Nama*"), Some(Field::Name));
    assert_eq!(field_for_header("Name *"), Some(Field::Name));
    assert_eq!(field_for_header("**No. Tel**"), Some(Field::Phone));

    let map = HeaderMap::from_headers(&["Nama*", "No IC*"]).unwrap();
    assert_eq!(map.column(Field::Name), Some(0));
    assert_eq!(map.column(Field::IcNo), Some(1));
  }

  #[test]
  fn unknown_columns_are_ignored() {
    let map = HeaderMap::from_headers(&["Bil", "Nama", "Catatan"]).unwrap();
    assert_eq!(map.column(Field::Name), Some(1));
    assert_eq!(map.fields().count(), 1);
  }

  #[test]
  fn first_matching_column_wins() {
    let map = HeaderMap::from_headers(&["Name", "Nama"]).unwrap();
    assert_eq!(map.column(Field::Name), Some(0));
  }

  #[test]
  fn missing_name_column_is_rejected() {
    let err = HeaderMap::from_headers(&["IC", "Phone"]).unwrap_err();
    assert!(matches!(err, Error::MissingNameColumn));
  }
}
