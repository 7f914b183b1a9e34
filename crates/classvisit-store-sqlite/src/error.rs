//! Error type for `classvisit-store-sqlite`.

use classvisit_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Domain failures: not found, conflicts, validation, delete guard.
  #[error(transparent)]
  Core(#[from] classvisit_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum column holds a value this build does not know.
  #[error("unrecognised column value: {0}")]
  Decode(String),
}

impl StoreError for Error {
  fn domain(&self) -> Option<&classvisit_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
