//! [`AccessEngine`] — the entry point the web layer calls.
//!
//! Wires a [`PlatformStore`], a [`Clock`] and the [`PolicyConfig`] together.
//! Every call reads fresh state from the store; nothing authoritative is kept
//! between calls.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  audit::{AgeVerificationLog, ModerationLogEntry},
  clock::Clock,
  compliance::JurisdictionTable,
  config::PolicyConfig,
  moderation::{ModerationOutcome, Selection},
  store::PlatformStore,
  subscription::Subscription,
  user::ProfileView,
  visibility::{
    self, Decision, HiddenReason, ProfileDestination, ViewerContext,
  },
};

pub struct AccessEngine<S> {
  store:         S,
  clock:         Arc<dyn Clock>,
  config:        PolicyConfig,
  jurisdictions: JurisdictionTable,
}

impl<S: PlatformStore> AccessEngine<S> {
  /// Fails only if `config` contains a malformed country code.
  pub fn new(
    store: S,
    clock: Arc<dyn Clock>,
    config: PolicyConfig,
  ) -> Result<Self> {
    let jurisdictions =
      JurisdictionTable::with_overrides(&config.minimum_age_overrides)?;
    Ok(Self { store, clock, config, jurisdictions })
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn config(&self) -> &PolicyConfig { &self.config }

  pub fn now(&self) -> DateTime<Utc> { self.clock.now() }

  // ── Visibility ────────────────────────────────────────────────────────

  /// Build the viewer context for `viewer_id` from current store state.
  ///
  /// `None`, or an id that no longer names an active user, is anonymous.
  pub async fn viewer_context(
    &self,
    viewer_id: Option<Uuid>,
  ) -> Result<Option<ViewerContext>> {
    let Some(viewer_id) = viewer_id else {
      return Ok(None);
    };
    let Some(user) = self.store.get_user(viewer_id).await.map_err(store_err)?
    else {
      return Ok(None);
    };

    let active_subscriptions = self
      .store
      .active_subscriptions_of(viewer_id)
      .await
      .map_err(store_err)?
      .into_iter()
      .map(|s| s.creator_id)
      .collect();

    Ok(Some(ViewerContext {
      authenticated: true,
      user_id: Some(user.user_id),
      age_verified: user.age_verified,
      active_subscriptions,
    }))
  }

  /// Decide whether `content_id` may be shown to `viewer_id`.
  pub async fn resolve_visibility(
    &self,
    viewer_id: Option<Uuid>,
    content_id: Uuid,
  ) -> Result<Decision> {
    let Some(snapshot) =
      self.store.get_content(content_id).await.map_err(store_err)?
    else {
      return Ok(Decision::Hidden(HiddenReason::NotFound));
    };

    let viewer = self.viewer_context(viewer_id).await?;
    let decision = visibility::resolve(viewer.as_ref(), &snapshot);
    debug!(%content_id, ?viewer_id, ?decision, "visibility resolved");
    Ok(decision)
  }

  /// Map a handle to the profile view it should open.
  pub async fn resolve_profile_destination(
    &self,
    handle: &str,
    viewer_authenticated: bool,
  ) -> Result<(ProfileView, ProfileDestination)> {
    let profile = self
      .store
      .find_profile(handle.to_owned())
      .await
      .map_err(store_err)?
      .ok_or_else(|| Error::NotFound(format!("profile {handle:?}")))?;

    let destination =
      visibility::resolve_profile_destination(&profile, viewer_authenticated);
    Ok((profile, destination))
  }

  // ── Age compliance ────────────────────────────────────────────────────

  pub fn minimum_age(&self, country: &str) -> u32 {
    self.jurisdictions.minimum_age(country)
  }

  /// Verify a user's age and persist the outcome with its audit entry.
  pub async fn verify_age(
    &self,
    user_id: Uuid,
    birth_date: NaiveDate,
    country: &str,
    source_ip: Option<String>,
  ) -> Result<AgeVerificationLog> {
    let user = self
      .store
      .get_user(user_id)
      .await
      .map_err(store_err)?
      .ok_or(Error::UserNotFound(user_id))?;

    let record = match self.jurisdictions.verify(
      &user,
      birth_date,
      country,
      self.now(),
    ) {
      Ok(record) => record,
      Err(e) => {
        info!(%user_id, country, error = %e, "age verification rejected");
        return Err(e.into());
      }
    };

    let entry = self
      .store
      .record_age_verification(record, source_ip)
      .await
      .map_err(store_err)?;
    info!(
      %user_id,
      country = %entry.country,
      age = entry.age_at_verification,
      "age verified"
    );
    Ok(entry)
  }

  pub async fn age_verification_log(
    &self,
    user_id: Uuid,
  ) -> Result<Vec<AgeVerificationLog>> {
    self
      .store
      .age_verification_log(user_id)
      .await
      .map_err(store_err)
  }

  // ── Subscriptions ─────────────────────────────────────────────────────

  pub async fn subscribe(
    &self,
    fan_id: Uuid,
    creator_id: Uuid,
  ) -> Result<Subscription> {
    if fan_id == creator_id {
      return Err(Error::SelfSubscription);
    }
    self
      .store
      .get_user(fan_id)
      .await
      .map_err(store_err)?
      .ok_or(Error::UserNotFound(fan_id))?;
    self
      .store
      .get_user(creator_id)
      .await
      .map_err(store_err)?
      .filter(|u| u.is_creator)
      .ok_or(Error::CreatorNotFound(creator_id))?;

    let sub = self
      .store
      .subscribe(fan_id, creator_id, self.now())
      .await
      .map_err(store_err)?;
    info!(
      %fan_id,
      %creator_id,
      subscription_id = %sub.subscription_id,
      "subscription opened"
    );
    Ok(sub)
  }

  /// Cancel immediately; access ends with this call.
  pub async fn cancel(
    &self,
    subscription_id: Uuid,
    fan_id: Uuid,
  ) -> Result<Subscription> {
    let sub = self
      .store
      .cancel_subscription(subscription_id, fan_id, self.now())
      .await
      .map_err(store_err)?;
    info!(
      %fan_id,
      creator_id = %sub.creator_id,
      %subscription_id,
      "subscription cancelled"
    );
    Ok(sub)
  }

  pub async fn set_auto_renew(
    &self,
    subscription_id: Uuid,
    fan_id: Uuid,
    enabled: bool,
  ) -> Result<Subscription> {
    let sub = self
      .store
      .set_auto_renew(subscription_id, fan_id, enabled)
      .await
      .map_err(store_err)?;
    info!(%fan_id, %subscription_id, enabled, "auto-renew updated");
    Ok(sub)
  }

  pub async fn active_subscriptions_of(
    &self,
    fan_id: Uuid,
  ) -> Result<Vec<Subscription>> {
    self
      .store
      .active_subscriptions_of(fan_id)
      .await
      .map_err(store_err)
  }

  // ── Moderation ────────────────────────────────────────────────────────

  /// Only active users flagged as moderators may run bulk commands or read
  /// the audit trail.
  async fn require_moderator(&self, actor_id: Uuid) -> Result<()> {
    let allowed = self
      .store
      .get_user(actor_id)
      .await
      .map_err(store_err)?
      .is_some_and(|u| u.is_moderator);
    if !allowed {
      warn!(%actor_id, "moderation refused for non-moderator");
      return Err(Error::NotModerator(actor_id));
    }
    Ok(())
  }

  fn select(&self, ids: Vec<Uuid>) -> Result<Selection> {
    Selection::new(ids, self.config.max_moderation_selection)
  }

  pub async fn censor_bulk(
    &self,
    actor_id: Uuid,
    ids: Vec<Uuid>,
    reason: Option<String>,
  ) -> Result<ModerationOutcome> {
    self.require_moderator(actor_id).await?;
    let selection = self.select(ids)?;
    let selected = selection.ids().len();
    let reason = reason
      .map(|r| r.trim().to_owned())
      .filter(|r| !r.is_empty())
      .unwrap_or_else(|| self.config.default_censor_reason.clone());

    let outcome = self
      .store
      .censor_bulk(actor_id, selection, reason.clone(), self.now())
      .await
      .map_err(store_err)?;
    log_outcome("censor", actor_id, &outcome);
    info!(
      %actor_id,
      selected,
      affected = outcome.affected,
      %reason,
      "content censored"
    );
    Ok(outcome)
  }

  pub async fn uncensor_bulk(
    &self,
    actor_id: Uuid,
    ids: Vec<Uuid>,
  ) -> Result<ModerationOutcome> {
    self.require_moderator(actor_id).await?;
    let selection = self.select(ids)?;
    let selected = selection.ids().len();
    let outcome = self
      .store
      .uncensor_bulk(actor_id, selection, self.now())
      .await
      .map_err(store_err)?;
    log_outcome("uncensor", actor_id, &outcome);
    info!(%actor_id, selected, affected = outcome.affected, "content uncensored");
    Ok(outcome)
  }

  /// Irreversible. Callers must confirm with the operator first.
  pub async fn delete_bulk(
    &self,
    actor_id: Uuid,
    ids: Vec<Uuid>,
  ) -> Result<ModerationOutcome> {
    self.require_moderator(actor_id).await?;
    let selection = self.select(ids)?;
    let selected = selection.ids().len();
    let outcome = self
      .store
      .delete_bulk(actor_id, selection, self.now())
      .await
      .map_err(store_err)?;
    log_outcome("delete", actor_id, &outcome);
    info!(%actor_id, selected, affected = outcome.affected, "content deleted");
    Ok(outcome)
  }

  pub async fn moderation_log(
    &self,
    actor_id: Uuid,
    limit: usize,
  ) -> Result<Vec<ModerationLogEntry>> {
    self.require_moderator(actor_id).await?;
    self.store.moderation_log(limit).await.map_err(store_err)
  }
}

fn log_outcome(action: &str, actor_id: Uuid, outcome: &ModerationOutcome) {
  if !outcome.not_found.is_empty() {
    warn!(
      action,
      %actor_id,
      missing = outcome.not_found.len(),
      ids = ?outcome.not_found,
      "moderation selection contained unknown content ids"
    );
  }
}

fn store_err<E: Into<Error>>(e: E) -> Error { e.into() }
