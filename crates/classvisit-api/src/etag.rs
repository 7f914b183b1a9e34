//! ETags for full-record replace.
//!
//! An ETag is the SHA-256 of the record's JSON form. Records serialise
//! deterministically (fixed field order, score keys sorted), so equal
//! records always share a tag.

use axum::{
  Json,
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::ApiError;

/// Quoted hex digest of `record`.
pub fn compute_etag<T: Serialize>(record: &T) -> Result<String, serde_json::Error> {
  let bytes = serde_json::to_vec(record)?;
  let hash = Sha256::digest(&bytes);
  Ok(format!("\"{}\"", hex::encode(hash)))
}

/// Whether the request's `If-Match` allows writing over `current`.
///
/// No header means an unconditional write. Tags are compared with or without
/// surrounding quotes; `*` matches any existing record.
pub fn if_match_satisfied(headers: &HeaderMap, current: &str) -> bool {
  let Some(value) = headers.get(header::IF_MATCH) else {
    return true;
  };
  let Ok(value) = value.to_str() else {
    return false;
  };
  let current = current.trim_matches('"');
  value
    .split(',')
    .map(str::trim)
    .any(|tag| tag == "*" || tag.trim_matches('"') == current)
}

/// Refuse the write with 412 unless `If-Match` allows replacing `current`.
pub(crate) fn check_if_match<T: Serialize>(headers: &HeaderMap, current: &T) -> Result<(), ApiError> {
  let tag = compute_etag(current).map_err(|e| ApiError::Internal(e.to_string()))?;
  if if_match_satisfied(headers, &tag) {
    Ok(())
  } else {
    Err(ApiError::PreconditionFailed)
  }
}

/// A JSON response carrying the record's ETag.
pub(crate) fn with_etag<T: Serialize>(status: StatusCode, record: &T) -> Result<Response, ApiError> {
  let tag = compute_etag(record).map_err(|e| ApiError::Internal(e.to_string()))?;
  Ok((status, [(header::ETAG, tag)], Json(record)).into_response())
}
