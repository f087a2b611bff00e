//! Demographic inference from a Malaysian IC (MyKad) number.
//!
//! A MyKad number is `YYMMDD-PB-###G`: the first six digits are the date of
//! birth and the final digit is odd for males, even for females. Kept as a
//! standalone pure function so a deployment can turn it off (see
//! [`crate::ParseOptions::infer_demographics`]).

use chrono::{Datelike, NaiveDate};
use keahlian_core::member::Gender;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IcInference {
  pub gender: Option<Gender>,
  pub age:    Option<u32>,
}

/// Infer gender and age (in whole years at `today`) from a digits-only IC
/// number. Anything that is not exactly 12 digits yields nothing; an
/// impossible birth date yields no age.
pub fn infer_from_ic(ic: &str, today: NaiveDate) -> IcInference {
  if ic.len() != 12 || !ic.bytes().all(|b| b.is_ascii_digit()) {
    return IcInference::default();
  }

  let digit = |i: usize| u32::from(ic.as_bytes()[i] - b'0');

  let gender = if digit(11) % 2 == 1 { Gender::M } else { Gender::F };

  let yy = (digit(0) * 10 + digit(1)) as i32;
  let month = digit(2) * 10 + digit(3);
  let day = digit(4) * 10 + digit(5);

  IcInference {
    gender: Some(gender),
    age:    birth_date(yy, month, day, today).and_then(|born| age_at(born, today)),
  }
}

/// Pick the century that keeps the birth date out of the future.
fn birth_date(yy: i32, month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
  let this_century = NaiveDate::from_ymd_opt(2000 + yy, month, day);
  match this_century {
    Some(date) if date <= today => Some(date),
    _ => NaiveDate::from_ymd_opt(1900 + yy, month, day),
  }
}

fn age_at(born: NaiveDate, today: NaiveDate) -> Option<u32> {
  let mut years = today.year() - born.year();
  if (today.month(), today.day()) < (born.month(), born.day()) {
    years -= 1;
  }
  u32::try_from(years).ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 6, 15).unwrap() }

  #[test]
  fn odd_last_digit_is_male() {
    let inferred = infer_from_ic("850312145671", today());
    assert_eq!(inferred.gender, Some(Gender::M));
    assert_eq!(inferred.age, Some(39));
  }

  #[test]
  fn even_last_digit_is_female() {
    let inferred = infer_from_ic("900616105588", today());
    assert_eq!(inferred.gender, Some(Gender::F));
    // Birthday is tomorrow.
    assert_eq!(inferred.age, Some(33));
  }

  #[test]
  fn recent_births_use_this_century() {
    let inferred = infer_from_ic("050101011234", today());
    assert_eq!(inferred.age, Some(19));
  }

  #[test]
  fn future_two_digit_year_falls_back_to_last_century() {
    let inferred = infer_from_ic("300101011234", today());
    assert_eq!(inferred.age, Some(94));
  }

  #[test]
  fn impossible_date_keeps_gender_only() {
    let inferred = infer_from_ic("881345011233", today());
    assert_eq!(inferred.gender, Some(Gender::M));
    assert_eq!(inferred.age, None);
  }

  #[test]
  fn wrong_length_infers_nothing() {
    assert_eq!(infer_from_ic("12345", today()), IcInference::default());
    assert_eq!(infer_from_ic("", today()), IcInference::default());
  }
}
