//! Users — fans, creators, and the profile read model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A platform account.
///
/// `is_active == false` is a soft delete: the row is kept so subscriptions
/// and audit entries keep their history, but lookups never return it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:          Uuid,
  pub user_name:        String,
  /// Alternate handle; matched case-insensitively alongside `user_name`.
  pub pseudonym:        Option<String>,
  pub is_active:        bool,
  pub is_creator:       bool,
  /// Trust gate required before restricted-surface content is served.
  pub creator_verified: bool,
  pub birth_date:       Option<NaiveDate>,
  /// ISO 3166-1 alpha-2 code, upper-case.
  pub country:          Option<String>,
  pub age_verified:     bool,
  pub age_verified_at:  Option<DateTime<Utc>>,
  /// Granted by the identity layer; required for bulk moderation.
  pub is_moderator:     bool,
  pub created_at:       DateTime<Utc>,
}

/// Input to [`crate::store::PlatformStore::add_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub user_name:        String,
  pub pseudonym:        Option<String>,
  pub is_creator:       bool,
  pub creator_verified: bool,
  pub is_moderator:     bool,
}

impl NewUser {
  /// A plain fan account.
  pub fn fan(user_name: impl Into<String>) -> Self {
    Self {
      user_name:        user_name.into(),
      pseudonym:        None,
      is_creator:       false,
      creator_verified: false,
      is_moderator:     false,
    }
  }

  /// A staff account allowed to run bulk moderation.
  pub fn moderator(user_name: impl Into<String>) -> Self {
    Self { is_moderator: true, ..Self::fan(user_name) }
  }

  /// A creator account, verified or not.
  pub fn creator(user_name: impl Into<String>, verified: bool) -> Self {
    Self {
      user_name:        user_name.into(),
      pseudonym:        None,
      is_creator:       true,
      creator_verified: verified,
      is_moderator:     false,
    }
  }

  pub fn with_pseudonym(mut self, pseudonym: impl Into<String>) -> Self {
    self.pseudonym = Some(pseudonym.into());
    self
  }
}

/// A user bundled with the facts derived from their content at read time.
/// Never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
  pub user:                   User,
  /// True iff the user has at least one published restricted-surface item.
  pub has_restricted_surface: bool,
}

impl ProfileView {
  /// Verified creators with a restricted surface are always discoverable
  /// through their public profile.
  pub fn is_gated_creator(&self) -> bool {
    self.user.is_creator
      && self.user.creator_verified
      && self.has_restricted_surface
  }
}
