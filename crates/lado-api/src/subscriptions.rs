//! Handlers for `/subscriptions` endpoints. All require a viewer, who acts
//! as the fan.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/subscriptions` | Viewer's active subscriptions, newest first |
//! | `POST` | `/subscriptions` | Body: `{"creator_id":"..."}`; returns 201 |
//! | `POST` | `/subscriptions/{id}/cancel` | Immediate; 404 unless the viewer is the fan |
//! | `PUT`  | `/subscriptions/{id}/auto-renew` | Body: `{"enabled":false}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use lado_core::{AccessEngine, store::PlatformStore, subscription::Subscription};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, viewer::Viewer};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /subscriptions`
pub async fn list<S: PlatformStore>(
  State(engine): State<Arc<AccessEngine<S>>>,
  viewer: Viewer,
) -> Result<Json<Vec<Subscription>>, ApiError> {
  let fan_id = viewer.require()?;
  Ok(Json(engine.active_subscriptions_of(fan_id).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubscribeBody {
  pub creator_id: Uuid,
}

/// `POST /subscriptions`
pub async fn create<S: PlatformStore>(
  State(engine): State<Arc<AccessEngine<S>>>,
  viewer: Viewer,
  Json(body): Json<SubscribeBody>,
) -> Result<impl IntoResponse, ApiError> {
  let fan_id = viewer.require()?;
  let sub = engine.subscribe(fan_id, body.creator_id).await?;
  Ok((StatusCode::CREATED, Json(sub)))
}

// ─── Cancel ───────────────────────────────────────────────────────────────────

/// `POST /subscriptions/{id}/cancel`
pub async fn cancel<S: PlatformStore>(
  State(engine): State<Arc<AccessEngine<S>>>,
  viewer: Viewer,
  Path(subscription_id): Path<Uuid>,
) -> Result<Json<Subscription>, ApiError> {
  let fan_id = viewer.require()?;
  Ok(Json(engine.cancel(subscription_id, fan_id).await?))
}

// ─── Auto-renew ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AutoRenewBody {
  pub enabled: bool,
}

/// `PUT /subscriptions/{id}/auto-renew`
pub async fn auto_renew<S: PlatformStore>(
  State(engine): State<Arc<AccessEngine<S>>>,
  viewer: Viewer,
  Path(subscription_id): Path<Uuid>,
  Json(body): Json<AutoRenewBody>,
) -> Result<Json<Subscription>, ApiError> {
  let fan_id = viewer.require()?;
  let sub = engine
    .set_auto_renew(subscription_id, fan_id, body.enabled)
    .await?;
  Ok(Json(sub))
}
