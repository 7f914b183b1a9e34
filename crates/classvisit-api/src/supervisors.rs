//! Handlers for `/supervisors` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/supervisors` | Ordered by name |
//! | `POST`   | `/supervisors` | Admin. Body: [`SupervisorInput`]; returns 201 + ETag |
//! | `GET`    | `/supervisors/{id}` | Returns ETag |
//! | `PUT`    | `/supervisors/{id}` | Admin. Full replace; honours `If-Match` |
//! | `DELETE` | `/supervisors/{id}` | Admin. 409 while visits reference the supervisor |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::Response,
};
use classvisit_core::{
  store::RecordStore,
  supervisor::{Supervisor, SupervisorInput},
};
use uuid::Uuid;

use crate::{
  actor::{Actor, Admin},
  error::ApiError,
  etag::{check_if_match, with_etag},
  extract::{ApiJson, ApiPath},
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /supervisors`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  _actor: Actor,
) -> Result<Json<Vec<Supervisor>>, ApiError>
where
  S: RecordStore,
{
  let supervisors = store.list_supervisors().await.map_err(ApiError::from_store)?;
  Ok(Json(supervisors))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

async fn load<S: RecordStore>(store: &S, id: Uuid) -> Result<Supervisor, ApiError> {
  store
    .get_supervisor(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("supervisor {id} not found")))
}

/// `GET /supervisors/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  _actor: Actor,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  let supervisor = load(store.as_ref(), id).await?;
  with_etag(StatusCode::OK, &supervisor)
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /supervisors`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Admin(admin): Admin,
  ApiJson(body): ApiJson<SupervisorInput>,
) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  let supervisor = store.add_supervisor(body).await.map_err(ApiError::from_store)?;
  tracing::info!(supervisor_id = %supervisor.supervisor_id, by = %admin.username, "supervisor added");
  with_etag(StatusCode::CREATED, &supervisor)
}

// ─── Replace ──────────────────────────────────────────────────────────────────

/// `PUT /supervisors/{id}`
pub async fn replace<S>(
  State(store): State<Arc<S>>,
  Admin(admin): Admin,
  ApiPath(id): ApiPath<Uuid>,
  headers: HeaderMap,
  ApiJson(body): ApiJson<SupervisorInput>,
) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  let expected = if headers.contains_key(header::IF_MATCH) {
    let current = load(store.as_ref(), id).await?;
    check_if_match(&headers, &current)?;
    Some(current)
  } else {
    None
  };

  let supervisor = store
    .replace_supervisor(id, body, expected)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(supervisor_id = %id, by = %admin.username, "supervisor replaced");
  with_etag(StatusCode::OK, &supervisor)
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /supervisors/{id}`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  Admin(admin): Admin,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: RecordStore,
{
  store.delete_supervisor(id).await.map_err(ApiError::from_store)?;
  tracing::info!(supervisor_id = %id, by = %admin.username, "supervisor deleted");
  Ok(StatusCode::NO_CONTENT)
}
