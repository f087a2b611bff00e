//! Malaysian postcode → state lookup.

/// Inclusive postcode ranges, ascending and non-overlapping.
const RANGES: &[(u32, u32, &str)] = &[
  (1000, 2999, "Perlis"),
  (5000, 9999, "Kedah"),
  (10000, 14999, "Pulau Pinang"),
  (15000, 18999, "Kelantan"),
  (20000, 24999, "Terengganu"),
  (25000, 28999, "Pahang"),
  (30000, 36999, "Perak"),
  (39000, 39999, "Pahang"),
  (40000, 48999, "Selangor"),
  (49000, 49999, "Pahang"),
  (50000, 60999, "Wilayah Persekutuan Kuala Lumpur"),
  (62000, 62999, "Wilayah Persekutuan Putrajaya"),
  (63000, 68999, "Selangor"),
  (69000, 69999, "Pahang"),
  (70000, 73999, "Negeri Sembilan"),
  (75000, 78999, "Melaka"),
  (79000, 86999, "Johor"),
  (87000, 87999, "Wilayah Persekutuan Labuan"),
  (88000, 91999, "Sabah"),
  (93000, 98999, "Sarawak"),
];

/// The state a 5-digit postcode belongs to, if it falls in a known range.
pub fn state_for_postcode(postcode: &str) -> Option<&'static str> {
  if postcode.len() != 5 || !postcode.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  let code: u32 = postcode.parse().ok()?;
  RANGES
    .iter()
    .find(|(low, high, _)| (*low..=*high).contains(&code))
    .map(|(_, _, state)| *state)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_postcodes() {
    assert_eq!(state_for_postcode("50450"), Some("Wilayah Persekutuan Kuala Lumpur"));
    assert_eq!(state_for_postcode("81300"), Some("Johor"));
    assert_eq!(state_for_postcode("01000"), Some("Perlis"));
    assert_eq!(state_for_postcode("93350"), Some("Sarawak"));
  }

  #[test]
  fn gaps_and_malformed_codes() {
    assert_eq!(state_for_postcode("03000"), None);
    assert_eq!(state_for_postcode("1000"), None);
    assert_eq!(state_for_postcode("5O450"), None);
  }
}
