//! Bulk moderation inputs and outputs.
//!
//! Store implementations accept only a [`Selection`], so an empty or oversized
//! id set is rejected before any query runs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Default upper bound on the number of ids in one bulk operation.
pub const DEFAULT_MAX_SELECTION: usize = 1000;

/// Reason recorded when a censor call does not supply one.
pub const DEFAULT_CENSOR_REASON: &str = "Inappropriate content";

/// A validated, de-duplicated, non-empty set of content ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
  ids: Vec<Uuid>,
}

impl Selection {
  /// Validate `ids` against `max`. Order of first occurrence is kept.
  pub fn new(ids: impl IntoIterator<Item = Uuid>, max: usize) -> Result<Self> {
    let mut seen = std::collections::HashSet::new();
    let ids: Vec<Uuid> = ids.into_iter().filter(|id| seen.insert(*id)).collect();

    if ids.is_empty() {
      return Err(Error::NoSelection);
    }
    if ids.len() > max {
      return Err(Error::SelectionTooLarge { max });
    }
    Ok(Self { ids })
  }

  pub fn ids(&self) -> &[Uuid] { &self.ids }

  pub fn into_ids(self) -> Vec<Uuid> { self.ids }
}

/// Result of a bulk moderation call. Missing ids are not an error; they are
/// reported here so callers can surface a warning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationOutcome {
  /// Number of items that existed and were mutated.
  pub affected:  usize,
  /// Selected ids that matched no content.
  pub not_found: Vec<Uuid>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_selection_is_rejected() {
    let err = Selection::new(Vec::new(), DEFAULT_MAX_SELECTION).unwrap_err();
    assert!(matches!(err, Error::NoSelection));
  }

  #[test]
  fn oversized_selection_is_rejected() {
    let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
    let err = Selection::new(ids, 3).unwrap_err();
    assert!(matches!(err, Error::SelectionTooLarge { max: 3 }));
  }

  #[test]
  fn duplicates_are_collapsed_before_the_cap() {
    let id = Uuid::new_v4();
    let other = Uuid::new_v4();
    let sel = Selection::new([id, other, id, id], 2).unwrap();
    assert_eq!(sel.ids(), &[id, other]);
  }
}
