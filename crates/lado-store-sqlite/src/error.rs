//! Error type for `lado-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain rule was violated (duplicate subscription, unknown id, ...).
  #[error(transparent)]
  Core(#[from] lado_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {column} value: {value:?}")]
  UnknownValue { column: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for lado_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => lado_core::Error::Store(Box::new(other)),
    }
  }
}
