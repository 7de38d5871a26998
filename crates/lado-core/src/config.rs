//! Tunable policy settings, deserialised from the `[policy]` table of the
//! server configuration.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::moderation::{DEFAULT_CENSOR_REASON, DEFAULT_MAX_SELECTION};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
  /// Largest id set accepted by one bulk moderation call.
  pub max_moderation_selection: usize,
  /// Censor reason used when the moderator gives none.
  pub default_censor_reason:    String,
  /// ISO country code → minimum age, layered over the built-in table.
  pub minimum_age_overrides:    BTreeMap<String, u32>,
}

impl Default for PolicyConfig {
  fn default() -> Self {
    Self {
      max_moderation_selection: DEFAULT_MAX_SELECTION,
      default_censor_reason:    DEFAULT_CENSOR_REASON.to_owned(),
      minimum_age_overrides:    BTreeMap::new(),
    }
  }
}
