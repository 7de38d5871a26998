//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use lado_core::compliance::ComplianceError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] lado_core::Error),

  #[error("this endpoint requires an authenticated viewer")]
  Unauthenticated,

  #[error("bad request: {0}")]
  BadRequest(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    use lado_core::Error as E;

    match self {
      ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Core(e) => match e {
        E::NotFound(_)
        | E::UserNotFound(_)
        | E::CreatorNotFound(_)
        | E::SubscriptionNotFound(_) => StatusCode::NOT_FOUND,
        E::DuplicateActiveSubscription { .. }
        | E::AlreadyCancelled(_)
        | E::HandleTaken(_) => StatusCode::CONFLICT,
        E::Compliance(ComplianceError::UnderMinimumAge { .. })
        | E::NotModerator(_) => StatusCode::FORBIDDEN,
        E::Compliance(_) => StatusCode::UNPROCESSABLE_ENTITY,
        E::NoSelection | E::SelectionTooLarge { .. } | E::SelfSubscription => {
          StatusCode::BAD_REQUEST
        }
        E::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
      tracing::error!(error = %self, "request failed");
      "internal error".to_owned()
    } else {
      self.to_string()
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
