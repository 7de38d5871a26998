//! The visibility policy: one ordered, pure decision over a viewer and a
//! content snapshot.
//!
//! Checks run in a fixed order and stop at the first blocking condition:
//!
//! 1. inactive
//! 2. draft (the owner skips straight to step 6)
//! 3. censored
//! 4. private
//! 5. restricted surface: authentication, creator verification, subscription
//! 6. age-sensitive
//!
//! Structural and legal blocks come before monetisation gates, which come
//! before age sensitivity. A subscription never exposes censored content and
//! never bypasses the age gate.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  content::{ContentSnapshot, Surface},
  user::ProfileView,
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// What is known about the viewer for a single evaluation.
///
/// Build it fresh from the store before each resolution; it must not outlive
/// the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerContext {
  pub authenticated:        bool,
  pub user_id:              Option<Uuid>,
  pub age_verified:         bool,
  /// Creator ids the viewer currently holds an active subscription to.
  pub active_subscriptions: HashSet<Uuid>,
}

impl ViewerContext {
  /// An authenticated viewer with no subscriptions.
  pub fn authenticated(user_id: Uuid, age_verified: bool) -> Self {
    Self {
      authenticated: true,
      user_id: Some(user_id),
      age_verified,
      active_subscriptions: HashSet::new(),
    }
  }

  pub fn with_subscription(mut self, creator_id: Uuid) -> Self {
    self.active_subscriptions.insert(creator_id);
    self
  }

  pub fn is_owner_of(&self, content: &ContentSnapshot) -> bool {
    self.user_id == Some(content.content.owner_id)
  }

  pub fn is_subscribed_to(&self, creator_id: Uuid) -> bool {
    self.active_subscriptions.contains(&creator_id)
  }
}

// ─── Decision ────────────────────────────────────────────────────────────────

/// Why a content item is withheld.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenReason {
  /// The caller could not find the content. Never produced by [`resolve`].
  NotFound,
  Inactive,
  Draft,
  Censored,
  Private,
  RequiresAuth,
  CreatorUnverified,
  RequiresSubscription,
  RequiresAgeVerification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Decision {
  Visible,
  Hidden(HiddenReason),
}

impl Decision {
  pub fn is_visible(&self) -> bool { matches!(self, Self::Visible) }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Decide whether `content` may be shown to `viewer` (`None` = anonymous).
pub fn resolve(
  viewer: Option<&ViewerContext>,
  content: &ContentSnapshot,
) -> Decision {
  use HiddenReason::*;

  let item = &content.content;
  let is_owner = viewer.is_some_and(|v| v.is_owner_of(content));

  if !item.is_active {
    return Decision::Hidden(Inactive);
  }

  let owner_draft = item.is_draft && is_owner;
  if item.is_draft && !owner_draft {
    return Decision::Hidden(Draft);
  }

  // Censorship holds even against the owner's draft exception.
  if item.is_censored {
    return Decision::Hidden(Censored);
  }

  if !owner_draft {
    if item.is_private && !is_owner {
      return Decision::Hidden(Private);
    }

    if item.surface == Surface::Restricted {
      let Some(viewer) = viewer.filter(|v| v.authenticated) else {
        return Decision::Hidden(RequiresAuth);
      };
      if !content.owner_creator_verified {
        return Decision::Hidden(CreatorUnverified);
      }
      if !is_owner && !viewer.is_subscribed_to(item.owner_id) {
        return Decision::Hidden(RequiresSubscription);
      }
    }
  }

  let age_verified = viewer.is_some_and(|v| v.age_verified);
  if item.is_sensitive && !age_verified {
    return Decision::Hidden(RequiresAgeVerification);
  }

  Decision::Visible
}

// ─── Profile destination ─────────────────────────────────────────────────────

/// Which profile view a handle lookup should land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileDestination {
  PublicProfile,
  PrivateProfile,
}

/// Route a matched profile. Verified creators with a restricted surface always
/// land on the public profile so anonymous visitors can discover and
/// subscribe; otherwise authenticated viewers get the internal profile.
pub fn resolve_profile_destination(
  target: &ProfileView,
  viewer_authenticated: bool,
) -> ProfileDestination {
  if target.is_gated_creator() {
    ProfileDestination::PublicProfile
  } else if viewer_authenticated {
    ProfileDestination::PrivateProfile
  } else {
    ProfileDestination::PublicProfile
  }
}
