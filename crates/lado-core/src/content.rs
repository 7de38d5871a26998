//! Content items and the snapshot the visibility resolver consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which side of the platform a content item is published on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
  /// LadoA: open to everyone.
  Public,
  /// LadoB: gated behind a subscription to the owner.
  Restricted,
}

/// A media item owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
  pub content_id:    Uuid,
  pub owner_id:      Uuid,
  pub file_path:     String,
  /// Preferred over `file_path` for mosaic rendering.
  pub thumbnail:     Option<String>,
  pub surface:       Surface,
  pub is_active:     bool,
  pub is_draft:      bool,
  pub is_censored:   bool,
  /// Set only while `is_censored` is true.
  pub censor_reason: Option<String>,
  pub is_private:    bool,
  pub is_sensitive:  bool,
  pub like_count:    u64,
  pub view_count:    u64,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::PlatformStore::add_content`].
///
/// Censorship is not accepted here; it is only ever applied through the
/// moderation operations.
#[derive(Debug, Clone)]
pub struct NewContent {
  pub owner_id:     Uuid,
  pub file_path:    String,
  pub thumbnail:    Option<String>,
  pub surface:      Surface,
  pub is_draft:     bool,
  pub is_private:   bool,
  pub is_sensitive: bool,
}

impl NewContent {
  /// A published, non-private, non-sensitive item on `surface`.
  pub fn new(
    owner_id: Uuid,
    file_path: impl Into<String>,
    surface: Surface,
  ) -> Self {
    Self {
      owner_id,
      file_path: file_path.into(),
      thumbnail: None,
      surface,
      is_draft: false,
      is_private: false,
      is_sensitive: false,
    }
  }
}

/// Everything the resolver needs to know about one content item, captured at
/// a single read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSnapshot {
  pub content:                Content,
  /// `creator_verified` of the owner at the time of the read.
  pub owner_creator_verified: bool,
}
