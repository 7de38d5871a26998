//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that lexical order is chronological. Calendar dates are `YYYY-MM-DD`.
//! UUIDs are hyphenated lowercase strings. Id lists are compact JSON arrays.
//! Booleans use SQLite's native 0/1 integers.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use lado_core::{
  audit::{AgeVerificationLog, ModerationAction, ModerationLogEntry},
  content::{Content, ContentSnapshot, Surface},
  subscription::Subscription,
  user::{ProfileView, User},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_uuids(ids: &[Uuid]) -> Result<String> {
  Ok(serde_json::to_string(ids)?)
}

pub fn decode_uuids(s: &str) -> Result<Vec<Uuid>> {
  Ok(serde_json::from_str(s)?)
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Surface ─────────────────────────────────────────────────────────────────

pub fn encode_surface(s: Surface) -> &'static str {
  match s {
    Surface::Public => "public",
    Surface::Restricted => "restricted",
  }
}

pub fn decode_surface(s: &str) -> Result<Surface> {
  match s {
    "public" => Ok(Surface::Public),
    "restricted" => Ok(Surface::Restricted),
    other => Err(Error::UnknownValue {
      column: "surface",
      value:  other.to_owned(),
    }),
  }
}

// ─── ModerationAction ────────────────────────────────────────────────────────

pub fn encode_action(a: ModerationAction) -> &'static str {
  match a {
    ModerationAction::Censor => "censor",
    ModerationAction::Uncensor => "uncensor",
    ModerationAction::Delete => "delete",
  }
}

pub fn decode_action(s: &str) -> Result<ModerationAction> {
  match s {
    "censor" => Ok(ModerationAction::Censor),
    "uncensor" => Ok(ModerationAction::Uncensor),
    "delete" => Ok(ModerationAction::Delete),
    other => Err(Error::UnknownValue {
      column: "action",
      value:  other.to_owned(),
    }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUser::from_row`].
pub const USER_COLUMNS: &str = "u.user_id, u.user_name, u.pseudonym, \
   u.is_active, u.is_creator, u.creator_verified, u.birth_date, u.country, \
   u.age_verified, u.age_verified_at, u.is_moderator, u.created_at";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:          String,
  pub user_name:        String,
  pub pseudonym:        Option<String>,
  pub is_active:        bool,
  pub is_creator:       bool,
  pub creator_verified: bool,
  pub birth_date:       Option<String>,
  pub country:          Option<String>,
  pub age_verified:     bool,
  pub age_verified_at:  Option<String>,
  pub is_moderator:     bool,
  pub created_at:       String,
}

impl RawUser {
  /// Read [`USER_COLUMNS`] starting at column 0.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:          row.get(0)?,
      user_name:        row.get(1)?,
      pseudonym:        row.get(2)?,
      is_active:        row.get(3)?,
      is_creator:       row.get(4)?,
      creator_verified: row.get(5)?,
      birth_date:       row.get(6)?,
      country:          row.get(7)?,
      age_verified:     row.get(8)?,
      age_verified_at:  row.get(9)?,
      is_moderator:     row.get(10)?,
      created_at:       row.get(11)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:          decode_uuid(&self.user_id)?,
      user_name:        self.user_name,
      pseudonym:        self.pseudonym,
      is_active:        self.is_active,
      is_creator:       self.is_creator,
      creator_verified: self.creator_verified,
      birth_date:       self.birth_date.as_deref().map(decode_date).transpose()?,
      country:          self.country,
      age_verified:     self.age_verified,
      age_verified_at:  decode_opt_dt(self.age_verified_at)?,
      is_moderator:     self.is_moderator,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// A `users` row plus the derived restricted-surface flag.
pub struct RawProfile {
  pub user:                   RawUser,
  pub has_restricted_surface: bool,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<ProfileView> {
    Ok(ProfileView {
      user:                   self.user.into_user()?,
      has_restricted_surface: self.has_restricted_surface,
    })
  }
}

/// Column list matching [`RawContent::from_row`].
pub const CONTENT_COLUMNS: &str = "c.content_id, c.owner_id, c.file_path, \
   c.thumbnail, c.surface, c.is_active, c.is_draft, c.is_censored, \
   c.censor_reason, c.is_private, c.is_sensitive, c.like_count, \
   c.view_count, c.created_at";

/// Raw values read directly from a `content` row.
pub struct RawContent {
  pub content_id:    String,
  pub owner_id:      String,
  pub file_path:     String,
  pub thumbnail:     Option<String>,
  pub surface:       String,
  pub is_active:     bool,
  pub is_draft:      bool,
  pub is_censored:   bool,
  pub censor_reason: Option<String>,
  pub is_private:    bool,
  pub is_sensitive:  bool,
  pub like_count:    i64,
  pub view_count:    i64,
  pub created_at:    String,
}

impl RawContent {
  /// Read [`CONTENT_COLUMNS`] starting at column 0.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      content_id:    row.get(0)?,
      owner_id:      row.get(1)?,
      file_path:     row.get(2)?,
      thumbnail:     row.get(3)?,
      surface:       row.get(4)?,
      is_active:     row.get(5)?,
      is_draft:      row.get(6)?,
      is_censored:   row.get(7)?,
      censor_reason: row.get(8)?,
      is_private:    row.get(9)?,
      is_sensitive:  row.get(10)?,
      like_count:    row.get(11)?,
      view_count:    row.get(12)?,
      created_at:    row.get(13)?,
    })
  }

  pub fn into_content(self) -> Result<Content> {
    Ok(Content {
      content_id:    decode_uuid(&self.content_id)?,
      owner_id:      decode_uuid(&self.owner_id)?,
      file_path:     self.file_path,
      thumbnail:     self.thumbnail,
      surface:       decode_surface(&self.surface)?,
      is_active:     self.is_active,
      is_draft:      self.is_draft,
      is_censored:   self.is_censored,
      censor_reason: self.censor_reason,
      is_private:    self.is_private,
      is_sensitive:  self.is_sensitive,
      like_count:    self.like_count.max(0) as u64,
      view_count:    self.view_count.max(0) as u64,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// A `content` row joined with its owner's verification flag.
pub struct RawSnapshot {
  pub content:                RawContent,
  pub owner_creator_verified: bool,
}

impl RawSnapshot {
  pub fn into_snapshot(self) -> Result<ContentSnapshot> {
    Ok(ContentSnapshot {
      content:                self.content.into_content()?,
      owner_creator_verified: self.owner_creator_verified,
    })
  }
}

/// Column list matching [`RawSubscription::from_row`].
pub const SUBSCRIPTION_COLUMNS: &str = "subscription_id, fan_id, creator_id, \
   started_at, cancelled_at, is_active, auto_renew";

/// Raw values read directly from a `subscriptions` row.
pub struct RawSubscription {
  pub subscription_id: String,
  pub fan_id:          String,
  pub creator_id:      String,
  pub started_at:      String,
  pub cancelled_at:    Option<String>,
  pub is_active:       bool,
  pub auto_renew:      bool,
}

impl RawSubscription {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subscription_id: row.get(0)?,
      fan_id:          row.get(1)?,
      creator_id:      row.get(2)?,
      started_at:      row.get(3)?,
      cancelled_at:    row.get(4)?,
      is_active:       row.get(5)?,
      auto_renew:      row.get(6)?,
    })
  }

  pub fn into_subscription(self) -> Result<Subscription> {
    Ok(Subscription {
      subscription_id: decode_uuid(&self.subscription_id)?,
      fan_id:          decode_uuid(&self.fan_id)?,
      creator_id:      decode_uuid(&self.creator_id)?,
      started_at:      decode_dt(&self.started_at)?,
      cancelled_at:    decode_opt_dt(self.cancelled_at)?,
      is_active:       self.is_active,
      auto_renew:      self.auto_renew,
    })
  }
}

/// Raw values read directly from an `age_verification_log` row.
pub struct RawAgeLog {
  pub log_id:              String,
  pub user_id:             String,
  pub verified_at:         String,
  pub country:             String,
  pub age_at_verification: i64,
  pub source_ip:           Option<String>,
}

impl RawAgeLog {
  pub fn into_entry(self) -> Result<AgeVerificationLog> {
    Ok(AgeVerificationLog {
      log_id:              decode_uuid(&self.log_id)?,
      user_id:             decode_uuid(&self.user_id)?,
      verified_at:         decode_dt(&self.verified_at)?,
      country:             self.country,
      age_at_verification: self.age_at_verification.max(0) as u32,
      source_ip:           self.source_ip,
    })
  }
}

/// Raw values read directly from a `moderation_log` row.
pub struct RawModerationLog {
  pub log_id:      String,
  pub actor_id:    String,
  pub action:      String,
  pub content_ids: String,
  pub reason:      Option<String>,
  pub recorded_at: String,
}

impl RawModerationLog {
  pub fn into_entry(self) -> Result<ModerationLogEntry> {
    Ok(ModerationLogEntry {
      log_id:      decode_uuid(&self.log_id)?,
      actor_id:    decode_uuid(&self.actor_id)?,
      action:      decode_action(&self.action)?,
      content_ids: decode_uuids(&self.content_ids)?,
      reason:      self.reason,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}
