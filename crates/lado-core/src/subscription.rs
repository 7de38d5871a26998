//! Subscriptions from a fan to a creator's restricted surface.
//!
//! A subscription row is created active and moves to cancelled exactly once.
//! Re-subscribing after a cancellation creates a new row; the cancelled row
//! is kept as history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
  pub subscription_id: Uuid,
  pub fan_id:          Uuid,
  pub creator_id:      Uuid,
  pub started_at:      DateTime<Utc>,
  /// `None` exactly while `is_active` is true.
  pub cancelled_at:    Option<DateTime<Utc>>,
  pub is_active:       bool,
  pub auto_renew:      bool,
}

/// Lifecycle state of a subscription, derived from its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubscriptionState {
  Active,
  Cancelled { at: DateTime<Utc> },
}

impl Subscription {
  pub fn state(&self) -> SubscriptionState {
    match self.cancelled_at {
      Some(at) if !self.is_active => SubscriptionState::Cancelled { at },
      _ => SubscriptionState::Active,
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn active() -> Subscription {
    Subscription {
      subscription_id: Uuid::new_v4(),
      fan_id:          Uuid::new_v4(),
      creator_id:      Uuid::new_v4(),
      started_at:      Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
      cancelled_at:    None,
      is_active:       true,
      auto_renew:      true,
    }
  }

  #[test]
  fn new_subscription_is_active() {
    assert_eq!(active().state(), SubscriptionState::Active);
  }

  #[test]
  fn cancelled_row_reports_cancellation_time() {
    let now = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
    let sub = Subscription {
      cancelled_at: Some(now),
      is_active: false,
      auto_renew: false,
      ..active()
    };
    assert_eq!(sub.state(), SubscriptionState::Cancelled { at: now });
  }
}
