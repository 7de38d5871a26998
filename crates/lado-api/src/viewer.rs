//! Viewer identity supplied by the upstream identity layer.
//!
//! Authentication happens in front of this service; it forwards the
//! authenticated user id in [`VIEWER_HEADER`]. A missing header is an
//! anonymous viewer.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

pub const VIEWER_HEADER: &str = "x-viewer-id";

/// The requesting user, if any.
#[derive(Debug, Clone, Copy)]
pub struct Viewer(pub Option<Uuid>);

impl Viewer {
  /// The viewer id, or `Unauthenticated` for anonymous requests.
  pub fn require(self) -> Result<Uuid, ApiError> {
    self.0.ok_or(ApiError::Unauthenticated)
  }
}

impl<S: Send + Sync> FromRequestParts<S> for Viewer {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let Some(raw) = parts.headers.get(VIEWER_HEADER) else {
      return Ok(Self(None));
    };
    let id = raw
      .to_str()
      .ok()
      .and_then(|s| Uuid::parse_str(s.trim()).ok())
      .ok_or_else(|| {
        ApiError::BadRequest(format!("malformed {VIEWER_HEADER} header"))
      })?;
    Ok(Self(Some(id)))
  }
}
