//! Error types for `lado-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::compliance::ComplianceError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("age verification failed: {0}")]
  Compliance(#[from] ComplianceError),

  #[error("an active subscription from {fan_id} to {creator_id} already exists")]
  DuplicateActiveSubscription { fan_id: Uuid, creator_id: Uuid },

  #[error("subscription not found: {0}")]
  SubscriptionNotFound(Uuid),

  #[error("subscription {0} is already cancelled")]
  AlreadyCancelled(Uuid),

  #[error("cannot subscribe to yourself")]
  SelfSubscription,

  #[error("creator not found: {0}")]
  CreatorNotFound(Uuid),

  #[error("user {0} may not moderate content")]
  NotModerator(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("handle {0:?} is already taken")]
  HandleTaken(String),

  #[error("no content selected")]
  NoSelection,

  #[error("selection exceeds the maximum of {max} items")]
  SelectionTooLarge { max: usize },

  #[error("not found: {0}")]
  NotFound(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
