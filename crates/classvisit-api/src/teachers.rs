//! Handlers for `/teachers` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/teachers` | Ordered by name |
//! | `POST`   | `/teachers` | Admin. Body: [`TeacherInput`]; returns 201 + ETag |
//! | `GET`    | `/teachers/{id}` | Returns ETag |
//! | `PUT`    | `/teachers/{id}` | Admin. Full replace; honours `If-Match` |
//! | `DELETE` | `/teachers/{id}` | Admin. 409 while visits reference the teacher |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::Response,
};
use classvisit_core::{
  store::RecordStore,
  teacher::{Teacher, TeacherInput},
};
use uuid::Uuid;

use crate::{
  actor::{Actor, Admin},
  error::ApiError,
  etag::{check_if_match, with_etag},
  extract::{ApiJson, ApiPath},
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /teachers`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  _actor: Actor,
) -> Result<Json<Vec<Teacher>>, ApiError>
where
  S: RecordStore,
{
  let teachers = store.list_teachers().await.map_err(ApiError::from_store)?;
  Ok(Json(teachers))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

async fn load<S: RecordStore>(store: &S, id: Uuid) -> Result<Teacher, ApiError> {
  store
    .get_teacher(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("teacher {id} not found")))
}

/// `GET /teachers/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  _actor: Actor,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  let teacher = load(store.as_ref(), id).await?;
  with_etag(StatusCode::OK, &teacher)
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /teachers`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Admin(admin): Admin,
  ApiJson(body): ApiJson<TeacherInput>,
) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  let teacher = store.add_teacher(body).await.map_err(ApiError::from_store)?;
  tracing::info!(teacher_id = %teacher.teacher_id, by = %admin.username, "teacher added");
  with_etag(StatusCode::CREATED, &teacher)
}

// ─── Replace ──────────────────────────────────────────────────────────────────

/// `PUT /teachers/{id}`
pub async fn replace<S>(
  State(store): State<Arc<S>>,
  Admin(admin): Admin,
  ApiPath(id): ApiPath<Uuid>,
  headers: HeaderMap,
  ApiJson(body): ApiJson<TeacherInput>,
) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  // A conditional write hands the record it was checked against to the
  // store, which refuses the write if the row moved on since.
  let expected = if headers.contains_key(header::IF_MATCH) {
    let current = load(store.as_ref(), id).await?;
    check_if_match(&headers, &current)?;
    Some(current)
  } else {
    None
  };

  let teacher = store
    .replace_teacher(id, body, expected)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(teacher_id = %id, by = %admin.username, "teacher replaced");
  with_etag(StatusCode::OK, &teacher)
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /teachers/{id}`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  Admin(admin): Admin,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: RecordStore,
{
  store.delete_teacher(id).await.map_err(ApiError::from_store)?;
  tracing::info!(teacher_id = %id, by = %admin.username, "teacher deleted");
  Ok(StatusCode::NO_CONTENT)
}
