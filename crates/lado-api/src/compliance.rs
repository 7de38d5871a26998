//! Handlers for age verification.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/jurisdictions/{country}` | Minimum age for an ISO country code; 422 if malformed |
//! | `POST` | `/age-verification` | Body: [`VerifyBody`]; returns 201 + log entry |
//! | `GET`  | `/age-verification` | Viewer's verification history, newest first |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use chrono::NaiveDate;
use lado_core::{
  AccessEngine,
  audit::AgeVerificationLog,
  compliance::normalize_country,
  store::PlatformStore,
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, viewer::Viewer};

// ─── Jurisdictions ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MinimumAge {
  pub country:     String,
  pub minimum_age: u32,
}

/// `GET /jurisdictions/{country}`
pub async fn minimum_age<S: PlatformStore>(
  State(engine): State<Arc<AccessEngine<S>>>,
  Path(country): Path<String>,
) -> Result<Json<MinimumAge>, ApiError> {
  let country = normalize_country(&country).map_err(lado_core::Error::from)?;
  let minimum_age = engine.minimum_age(&country);
  Ok(Json(MinimumAge { country, minimum_age }))
}

// ─── Verify ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
  pub birth_date: NaiveDate,
  pub country:    String,
}

/// First hop recorded by the reverse proxy, if any.
fn source_ip(headers: &HeaderMap) -> Option<String> {
  headers
    .get("x-forwarded-for")
    .and_then(|v| v.to_str().ok())
    .and_then(|s| s.split(',').next())
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty())
}

/// `POST /age-verification` — body: `{"birth_date":"2000-01-31","country":"CL"}`
pub async fn verify<S: PlatformStore>(
  State(engine): State<Arc<AccessEngine<S>>>,
  viewer: Viewer,
  headers: HeaderMap,
  Json(body): Json<VerifyBody>,
) -> Result<impl IntoResponse, ApiError> {
  let user_id = viewer.require()?;
  let entry = engine
    .verify_age(user_id, body.birth_date, &body.country, source_ip(&headers))
    .await?;
  Ok((StatusCode::CREATED, Json(entry)))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /age-verification`
pub async fn history<S: PlatformStore>(
  State(engine): State<Arc<AccessEngine<S>>>,
  viewer: Viewer,
) -> Result<Json<Vec<AgeVerificationLog>>, ApiError> {
  let user_id = viewer.require()?;
  let entries = engine.age_verification_log(user_id).await?;
  Ok(Json(entries))
}
