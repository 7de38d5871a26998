//! The `PlatformStore` trait — the persistence collaborator.
//!
//! The trait is implemented by storage backends (e.g. `lado-store-sqlite`).
//! Higher layers (`lado-api`) depend on this abstraction through
//! [`crate::engine::AccessEngine`], not on any concrete backend.
//!
//! Timestamps are always supplied by the caller so the clock stays
//! injectable. Multi-row writes (age verification, moderation) must be
//! atomic: the audit entry and the mutation it records either both commit or
//! neither does.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  audit::{AgeVerificationLog, ModerationLogEntry},
  compliance::VerifiedRecord,
  content::{Content, ContentSnapshot, NewContent},
  moderation::{ModerationOutcome, Selection},
  subscription::Subscription,
  user::{NewUser, ProfileView, User},
};

/// Abstraction over a Lado entity store backend.
///
/// Backend errors must convert into [`crate::Error`]; domain failures
/// (duplicate subscription, unknown id, ...) come back as the matching typed
/// variant after conversion.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait PlatformStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create a user. Fails with `HandleTaken` if the user name or pseudonym
  /// collides, case-insensitively, with any existing user name or pseudonym.
  fn add_user(
    &self,
    input: NewUser,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Look up an active user by id.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up an active user whose user name or pseudonym equals `handle`,
  /// ignoring case, together with their derived profile facts.
  fn find_profile(
    &self,
    handle: String,
  ) -> impl Future<Output = Result<Option<ProfileView>, Self::Error>> + Send + '_;

  /// Soft-delete a user. Their content, subscriptions and logs are kept but
  /// stop being served.
  fn deactivate_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Grant or revoke creator verification.
  fn set_creator_verified(
    &self,
    id: Uuid,
    verified: bool,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Apply a successful verification: set the user's birth date, country,
  /// `age_verified` and `age_verified_at`, and append one log entry, in one
  /// transaction.
  fn record_age_verification(
    &self,
    record: VerifiedRecord,
    source_ip: Option<String>,
  ) -> impl Future<Output = Result<AgeVerificationLog, Self::Error>> + Send + '_;

  /// All verification entries for a user, newest first.
  fn age_verification_log(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<AgeVerificationLog>, Self::Error>> + Send + '_;

  // ── Content ───────────────────────────────────────────────────────────

  fn add_content(
    &self,
    input: NewContent,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Content, Self::Error>> + Send + '_;

  /// Read a content item together with its owner's verification flag.
  /// Content of an inactive owner reads as missing.
  fn get_content(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ContentSnapshot>, Self::Error>> + Send + '_;

  // ── Subscriptions ─────────────────────────────────────────────────────

  /// Open an active subscription. Fails with `DuplicateActiveSubscription`
  /// if the pair already has one; this must hold under concurrent calls.
  fn subscribe(
    &self,
    fan_id: Uuid,
    creator_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;

  /// Cancel a subscription owned by `fan_id`. Fails with
  /// `SubscriptionNotFound` if no such subscription belongs to the fan, and
  /// with `AlreadyCancelled` if it is no longer active.
  fn cancel_subscription(
    &self,
    subscription_id: Uuid,
    fan_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;

  /// Toggle renewal on an active subscription owned by `fan_id`.
  fn set_auto_renew(
    &self,
    subscription_id: Uuid,
    fan_id: Uuid,
    enabled: bool,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;

  /// Active subscriptions of a fan to active creators, most recently
  /// started first.
  fn active_subscriptions_of(
    &self,
    fan_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + '_;

  // ── Moderation ────────────────────────────────────────────────────────

  /// Censor every selected item that exists and log the action.
  fn censor_bulk(
    &self,
    actor_id: Uuid,
    selection: Selection,
    reason: String,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<ModerationOutcome, Self::Error>> + Send + '_;

  /// Clear censorship on every selected item that exists and log the action.
  fn uncensor_bulk(
    &self,
    actor_id: Uuid,
    selection: Selection,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<ModerationOutcome, Self::Error>> + Send + '_;

  /// Permanently delete every selected item that exists and log the action.
  fn delete_bulk(
    &self,
    actor_id: Uuid,
    selection: Selection,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<ModerationOutcome, Self::Error>> + Send + '_;

  /// The most recent `limit` moderation entries, newest first.
  fn moderation_log(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<ModerationLogEntry>, Self::Error>> + Send + '_;
}
