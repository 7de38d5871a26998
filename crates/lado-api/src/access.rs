//! Handlers for visibility and profile routing.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/content/{id}/visibility` | [`Decision`] for the current viewer |
//! | `GET`  | `/profiles/{handle}` | Matches user name or pseudonym; 404 if unknown |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use lado_core::{
  AccessEngine,
  store::PlatformStore,
  user::ProfileView,
  visibility::{Decision, ProfileDestination},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{error::ApiError, viewer::Viewer};

// ─── Visibility ───────────────────────────────────────────────────────────────

/// `GET /content/{id}/visibility`
pub async fn visibility<S: PlatformStore>(
  State(engine): State<Arc<AccessEngine<S>>>,
  viewer: Viewer,
  Path(content_id): Path<Uuid>,
) -> Result<Json<Decision>, ApiError> {
  let decision = engine.resolve_visibility(viewer.0, content_id).await?;
  Ok(Json(decision))
}

// ─── Profile ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
  pub profile:     ProfileView,
  pub destination: ProfileDestination,
}

/// `GET /profiles/{handle}`
///
/// The viewer counts as authenticated only if their id names an active user.
pub async fn profile<S: PlatformStore>(
  State(engine): State<Arc<AccessEngine<S>>>,
  viewer: Viewer,
  Path(handle): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
  let authenticated = engine.viewer_context(viewer.0).await?.is_some();
  let (profile, destination) = engine
    .resolve_profile_destination(&handle, authenticated)
    .await?;
  Ok(Json(ProfileResponse { profile, destination }))
}
