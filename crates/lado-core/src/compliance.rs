//! Age compliance: the legal minimum age per jurisdiction and evaluation of a
//! verification attempt.
//!
//! Everything here is pure. Persisting the outcome (user mutation plus one
//! [`AgeVerificationLog`](crate::audit::AgeVerificationLog) entry) is the
//! store's job and happens in a single transaction.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::user::User;

/// Minimum age applied to any country without an explicit entry.
pub const DEFAULT_MINIMUM_AGE: u32 = 18;

/// Jurisdictions whose minimum differs from, or is pinned to, the default.
const BUILTIN_MINIMUM_AGES: &[(&str, u32)] = &[
  ("AR", 18),
  ("BR", 18),
  ("CL", 18),
  ("CO", 18),
  ("ES", 18),
  ("GB", 18),
  ("KR", 19),
  ("MX", 18),
  ("PE", 18),
  ("US", 18),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComplianceError {
  #[error("must be at least {required} years old (computed age {age})")]
  UnderMinimumAge { required: u32, age: i32 },

  #[error("birth date {0} is in the future")]
  BirthDateInFuture(NaiveDate),

  #[error("invalid ISO country code: {0:?}")]
  InvalidCountry(String),
}

/// The outcome of a successful verification, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedRecord {
  pub user_id:     Uuid,
  pub birth_date:  NaiveDate,
  /// Normalised upper-case ISO code.
  pub country:     String,
  pub age:         u32,
  pub verified_at: DateTime<Utc>,
}

/// Country code → legal minimum age, with [`DEFAULT_MINIMUM_AGE`] for
/// anything unmapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JurisdictionTable {
  ages:    BTreeMap<String, u32>,
  default: u32,
}

impl Default for JurisdictionTable {
  fn default() -> Self {
    Self {
      ages:    BUILTIN_MINIMUM_AGES
        .iter()
        .map(|(code, age)| ((*code).to_owned(), *age))
        .collect(),
      default: DEFAULT_MINIMUM_AGE,
    }
  }
}

impl JurisdictionTable {
  /// The built-in table with `overrides` layered on top. Override keys are
  /// normalised; invalid codes are rejected.
  pub fn with_overrides<'a>(
    overrides: impl IntoIterator<Item = (&'a String, &'a u32)>,
  ) -> Result<Self, ComplianceError> {
    let mut table = Self::default();
    for (code, age) in overrides {
      table.ages.insert(normalize_country(code)?, *age);
    }
    Ok(table)
  }

  /// Legal minimum age for `country`. Unknown or malformed codes get the
  /// default.
  pub fn minimum_age(&self, country: &str) -> u32 {
    normalize_country(country)
      .ok()
      .and_then(|code| self.ages.get(&code).copied())
      .unwrap_or(self.default)
  }

  /// Evaluate a verification attempt for `user` as of `now`.
  pub fn verify(
    &self,
    user: &User,
    birth_date: NaiveDate,
    country: &str,
    now: DateTime<Utc>,
  ) -> Result<VerifiedRecord, ComplianceError> {
    let country = normalize_country(country)?;
    let today = now.date_naive();
    if birth_date > today {
      return Err(ComplianceError::BirthDateInFuture(birth_date));
    }

    let age = age_on(birth_date, today);
    let required = self.minimum_age(&country);
    if age < required as i32 {
      return Err(ComplianceError::UnderMinimumAge { required, age });
    }

    Ok(VerifiedRecord {
      user_id: user.user_id,
      birth_date,
      country,
      age: age as u32,
      verified_at: now,
    })
  }
}

/// Whole years between `birth_date` and `today`, one less if this year's
/// anniversary has not yet been reached.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
  let mut age = today.year() - birth_date.year();
  if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
    age -= 1;
  }
  age
}

/// Trim and upper-case a two-letter ISO 3166-1 code.
pub fn normalize_country(code: &str) -> Result<String, ComplianceError> {
  let code = code.trim();
  if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
    Ok(code.to_ascii_uppercase())
  } else {
    Err(ComplianceError::InvalidCountry(code.to_owned()))
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn user() -> User {
    User {
      user_id:          Uuid::new_v4(),
      user_name:        "fan".into(),
      pseudonym:        None,
      is_active:        true,
      is_creator:       false,
      creator_verified: false,
      birth_date:       None,
      country:          None,
      age_verified:     false,
      age_verified_at:  None,
      is_moderator:     false,
      created_at:       Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
  }

  fn june_first() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn unmapped_country_defaults_to_eighteen() {
    let table = JurisdictionTable::default();
    assert_eq!(table.minimum_age("ZZ"), DEFAULT_MINIMUM_AGE);
    assert_eq!(table.minimum_age("not a code"), DEFAULT_MINIMUM_AGE);
  }

  #[test]
  fn mapped_country_uses_table() {
    let table = JurisdictionTable::default();
    assert_eq!(table.minimum_age("KR"), 19);
    assert_eq!(table.minimum_age("kr"), 19);
    assert_eq!(table.minimum_age("CL"), 18);
  }

  #[test]
  fn overrides_replace_builtin_entries() {
    let overrides: BTreeMap<String, u32> =
      [("cl".to_owned(), 21), ("NZ".to_owned(), 20)].into();
    let table = JurisdictionTable::with_overrides(&overrides).unwrap();
    assert_eq!(table.minimum_age("CL"), 21);
    assert_eq!(table.minimum_age("NZ"), 20);
    assert_eq!(table.minimum_age("AR"), 18);
  }

  #[test]
  fn invalid_override_key_is_rejected() {
    let overrides: BTreeMap<String, u32> = [("CHL".to_owned(), 18)].into();
    let err = JurisdictionTable::with_overrides(&overrides).unwrap_err();
    assert_eq!(err, ComplianceError::InvalidCountry("CHL".into()));
  }

  #[test]
  fn age_counts_anniversary() {
    let today = date(2024, 6, 1);
    assert_eq!(age_on(date(2006, 6, 1), today), 18);
    assert_eq!(age_on(date(2006, 6, 2), today), 17);
    assert_eq!(age_on(date(2006, 5, 31), today), 18);
    assert_eq!(age_on(date(2006, 12, 31), today), 17);
  }

  #[test]
  fn leap_day_birthday_turns_over_on_march_first() {
    assert_eq!(age_on(date(2004, 2, 29), date(2022, 2, 28)), 17);
    assert_eq!(age_on(date(2004, 2, 29), date(2022, 3, 1)), 18);
  }

  #[test]
  fn seventeen_in_chile_is_rejected() {
    let table = JurisdictionTable::default();
    let err = table
      .verify(&user(), date(2006, 6, 2), "CL", june_first())
      .unwrap_err();
    assert_eq!(err, ComplianceError::UnderMinimumAge {
      required: 18,
      age:      17,
    });
  }

  #[test]
  fn eighteen_in_chile_is_accepted() {
    let table = JurisdictionTable::default();
    let u = user();
    let record = table
      .verify(&u, date(2006, 6, 1), "cl", june_first())
      .unwrap();
    assert_eq!(record.user_id, u.user_id);
    assert_eq!(record.age, 18);
    assert_eq!(record.country, "CL");
    assert_eq!(record.verified_at, june_first());
  }

  #[test]
  fn eighteen_in_korea_is_rejected() {
    let table = JurisdictionTable::default();
    let err = table
      .verify(&user(), date(2006, 1, 1), "KR", june_first())
      .unwrap_err();
    assert!(matches!(
      err,
      ComplianceError::UnderMinimumAge { required: 19, .. }
    ));
  }

  #[test]
  fn future_birth_date_is_rejected() {
    let table = JurisdictionTable::default();
    let err = table
      .verify(&user(), date(2030, 1, 1), "CL", june_first())
      .unwrap_err();
    assert!(matches!(err, ComplianceError::BirthDateInFuture(_)));
  }

  #[test]
  fn malformed_country_is_rejected() {
    let table = JurisdictionTable::default();
    let err = table
      .verify(&user(), date(1990, 1, 1), "Chile", june_first())
      .unwrap_err();
    assert!(matches!(err, ComplianceError::InvalidCountry(_)));
  }
}
