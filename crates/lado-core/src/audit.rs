//! Append-only compliance records.
//!
//! Neither log is ever updated or deleted. Each entry is written in the same
//! transaction as the mutation it records, so a failed append rolls the
//! mutation back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One successful age verification. Re-verifying appends a new entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeVerificationLog {
  pub log_id:              Uuid,
  pub user_id:             Uuid,
  pub verified_at:         DateTime<Utc>,
  pub country:             String,
  pub age_at_verification: u32,
  pub source_ip:           Option<String>,
}

/// The kind of bulk moderation action applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
  Censor,
  Uncensor,
  Delete,
}

/// One bulk moderation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationLogEntry {
  pub log_id:      Uuid,
  pub actor_id:    Uuid,
  pub action:      ModerationAction,
  /// Ids that existed and were mutated.
  pub content_ids: Vec<Uuid>,
  /// Censor reason; `None` for uncensor and delete.
  pub reason:      Option<String>,
  pub recorded_at: DateTime<Utc>,
}
