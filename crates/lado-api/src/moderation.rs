//! Handlers for `/moderation` endpoints. The viewer is recorded as the actor
//! and must hold the moderator capability; anyone else gets 403.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/moderation/censor` | Body: `{"content_ids":[...],"reason":"..."}` |
//! | `POST` | `/moderation/uncensor` | Body: `{"content_ids":[...]}` |
//! | `POST` | `/moderation/delete` | Body: `{"content_ids":[...],"confirm":true}` |
//! | `GET`  | `/moderation/log` | Optional `?limit=` (default 50) |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use lado_core::{
  AccessEngine,
  audit::ModerationLogEntry,
  moderation::ModerationOutcome,
  store::PlatformStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, viewer::Viewer};

const DEFAULT_LOG_LIMIT: usize = 50;

// ─── Censor / uncensor ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CensorBody {
  pub content_ids: Vec<Uuid>,
  pub reason:      Option<String>,
}

/// `POST /moderation/censor`
pub async fn censor<S: PlatformStore>(
  State(engine): State<Arc<AccessEngine<S>>>,
  viewer: Viewer,
  Json(body): Json<CensorBody>,
) -> Result<Json<ModerationOutcome>, ApiError> {
  let actor_id = viewer.require()?;
  let outcome = engine
    .censor_bulk(actor_id, body.content_ids, body.reason)
    .await?;
  Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct SelectionBody {
  pub content_ids: Vec<Uuid>,
}

/// `POST /moderation/uncensor`
pub async fn uncensor<S: PlatformStore>(
  State(engine): State<Arc<AccessEngine<S>>>,
  viewer: Viewer,
  Json(body): Json<SelectionBody>,
) -> Result<Json<ModerationOutcome>, ApiError> {
  let actor_id = viewer.require()?;
  Ok(Json(engine.uncensor_bulk(actor_id, body.content_ids).await?))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeleteBody {
  pub content_ids: Vec<Uuid>,
  /// Must be `true`; deletion cannot be undone.
  #[serde(default)]
  pub confirm:     bool,
}

/// `POST /moderation/delete`
pub async fn delete<S: PlatformStore>(
  State(engine): State<Arc<AccessEngine<S>>>,
  viewer: Viewer,
  Json(body): Json<DeleteBody>,
) -> Result<Json<ModerationOutcome>, ApiError> {
  let actor_id = viewer.require()?;
  if !body.confirm {
    return Err(ApiError::BadRequest(
      "deletion is permanent; resend with \"confirm\": true".into(),
    ));
  }
  Ok(Json(engine.delete_bulk(actor_id, body.content_ids).await?))
}

// ─── Log ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LogParams {
  pub limit: Option<usize>,
}

/// `GET /moderation/log[?limit=<n>]`
pub async fn log<S: PlatformStore>(
  State(engine): State<Arc<AccessEngine<S>>>,
  viewer: Viewer,
  Query(params): Query<LogParams>,
) -> Result<Json<Vec<ModerationLogEntry>>, ApiError> {
  let actor_id = viewer.require()?;
  let limit = params.limit.unwrap_or(DEFAULT_LOG_LIMIT);
  Ok(Json(engine.moderation_log(actor_id, limit).await?))
}
