//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use classvisit_core::{Error as CoreError, FieldError, StoreError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("invalid input")]
  Validation(Vec<FieldError>),

  #[error("precondition failed")]
  PreconditionFailed,

  /// axum refused the request before a handler ran (bad body, path, or
  /// query). Keeps axum's status and message.
  #[error("{message}")]
  Rejected { status: StatusCode, message: String },

  #[error("internal error: {0}")]
  Internal(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error onto a response class via its domain error.
  pub fn from_store<E: StoreError>(e: E) -> Self {
    match e.domain() {
      Some(core) if !matches!(core, CoreError::Serialization(_) | CoreError::PasswordHash(_)) => {
        Self::from_core(core)
      }
      _ => Self::Store(Box::new(e)),
    }
  }

  fn from_core(e: &CoreError) -> Self {
    match e {
      CoreError::NotFound { .. } => Self::NotFound(e.to_string()),
      CoreError::Conflict(m) => Self::Conflict(m.clone()),
      CoreError::InUse { .. } => Self::Conflict(e.to_string()),
      CoreError::Stale { .. } => Self::PreconditionFailed,
      CoreError::Validation(fields) => Self::Validation(fields.clone()),
      CoreError::Serialization(_) | CoreError::PasswordHash(_) => Self::Internal(e.to_string()),
    }
  }
}

impl From<CoreError> for ApiError {
  fn from(e: CoreError) -> Self { Self::from_core(&e) }
}

macro_rules! from_rejection {
  ($($rejection:ty),+) => {
    $(impl From<$rejection> for ApiError {
      fn from(r: $rejection) -> Self {
        Self::Rejected { status: r.status(), message: r.body_text() }
      }
    })+
  };
}

from_rejection!(JsonRejection, PathRejection, QueryRejection, FormRejection);

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Unauthorized => {
        (StatusCode::UNAUTHORIZED, json!({ "error": "unauthorized" }))
      }
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, json!({ "error": m })),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "error": m })),
      ApiError::Validation(fields) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({ "error": "invalid input", "fields": fields }),
      ),
      ApiError::PreconditionFailed => (
        StatusCode::PRECONDITION_FAILED,
        json!({ "error": "record changed since it was read" }),
      ),
      ApiError::Rejected { status, message } => (*status, json!({ "error": message })),
      ApiError::Internal(_) | ApiError::Store(_) => {
        tracing::error!(error = %self, "request failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          json!({ "error": "internal server error" }),
        )
      }
    };
    (status, Json(body)).into_response()
  }
}
