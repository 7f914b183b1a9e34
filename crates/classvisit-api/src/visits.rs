//! Handlers for `/visits` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/visits` | Optional `teacher_id`, `supervisor_id`, `status`, `from`, `until`, `limit`, `offset` |
//! | `POST` | `/visits` | Body: [`VisitInput`]; returns 201 + ETag |
//! | `POST` | `/visits/form` | URL-encoded observation form; see [`form_input`] |
//! | `GET`  | `/visits/{id}` | Returns ETag |
//! | `PUT`  | `/visits/{id}` | Full replace; honours `If-Match` |
//! | `GET`  | `/visits/{id}/report` | [`VisitReport`] with per-group score summaries |

use std::{collections::HashMap, sync::Arc};

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::Response,
};
use chrono::NaiveDate;
use classvisit_core::{
  Error as CoreError, FieldError,
  report::VisitReport,
  score::{
    FEEDBACK_CRITERIA, FEEDBACK_PREFIX, MANAGEMENT_CRITERIA, MANAGEMENT_PREFIX, ScoreSheet,
    TEACHING_CRITERIA, TEACHING_PREFIX,
  },
  store::RecordStore,
  visit::{Visit, VisitInput, VisitQuery, VisitStatus},
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
  actor::Actor,
  error::ApiError,
  etag::{check_if_match, with_etag},
  extract::{ApiForm, ApiJson, ApiPath, ApiQuery},
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /visits?[teacher_id=..][&status=pending][&from=2024-01-01]...`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  _actor: Actor,
  ApiQuery(query): ApiQuery<VisitQuery>,
) -> Result<Json<Vec<Visit>>, ApiError>
where
  S: RecordStore,
{
  if matches!((query.from, query.until), (Some(from), Some(until)) if from > until) {
    return Err(ApiError::BadRequest("`from` is after `until`".into()));
  }
  let visits = store.list_visits(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(visits))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

async fn load<S: RecordStore>(store: &S, id: Uuid) -> Result<Visit, ApiError> {
  store
    .get_visit(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("visit {id} not found")))
}

/// `GET /visits/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  _actor: Actor,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  let visit = load(store.as_ref(), id).await?;
  with_etag(StatusCode::OK, &visit)
}

// ─── Create ───────────────────────────────────────────────────────────────────

async fn record<S: RecordStore>(
  store: &S,
  actor: &Actor,
  input: VisitInput,
) -> Result<Response, ApiError> {
  let visit = store.add_visit(input).await.map_err(ApiError::from_store)?;
  tracing::info!(
    visit_id = %visit.visit_id,
    teacher_id = %visit.teacher_id,
    by = %actor.0.username,
    "visit recorded"
  );
  with_etag(StatusCode::CREATED, &visit)
}

/// `POST /visits`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  actor: Actor,
  ApiJson(body): ApiJson<VisitInput>,
) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  record(store.as_ref(), &actor, body).await
}

/// `POST /visits/form`
pub async fn create_from_form<S>(
  State(store): State<Arc<S>>,
  actor: Actor,
  ApiForm(fields): ApiForm<HashMap<String, String>>,
) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  let input = form_input(&fields)?;
  record(store.as_ref(), &actor, input).await
}

/// Fold the flat observation form into a [`VisitInput`].
///
/// Rubric answers arrive as `management_1..=5`, `teaching_1..=10` and
/// `feedback_1..=5`; unanswered or blank criteria are stored as `null`.
/// Narrative feedback uses `feedback_text_1`/`feedback_text_2` because the
/// plain names belong to the feedback rubric. `visit_status` takes the
/// English or Arabic status label and defaults to completed.
pub fn form_input(fields: &HashMap<String, String>) -> Result<VisitInput, ApiError> {
  let text = |key: &str| fields.get(key).map(|v| v.trim()).unwrap_or_default();
  let optional = |key: &str| Some(text(key)).filter(|v| !v.is_empty()).map(str::to_owned);
  let sheet = |prefix: &str, count: usize| {
    ScoreSheet::from_form(prefix, count, |key| {
      optional(key).map(Value::String)
    })
  };

  let mut errors = Vec::new();
  let mut id = |field: &'static str| match Uuid::parse_str(text(field)) {
    Ok(id) => Some(id),
    Err(_) => {
      errors.push(FieldError::new(field, "must be a record id"));
      None
    }
  };
  let teacher_id = id("teacher_id");
  let supervisor_id = id("supervisor_id");

  let mut date = |field: &'static str, required: bool| {
    let raw = text(field);
    if raw.is_empty() && !required {
      return None;
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
      Ok(d) => Some(d),
      Err(_) => {
        errors.push(FieldError::new(field, "must be a date (YYYY-MM-DD)"));
        None
      }
    }
  };
  let visit_date = date("visit_date", true);
  let follow_up_date = date("follow_up_date", false);

  let status = match optional("visit_status") {
    None => Some(VisitStatus::default()),
    Some(label) => match label.parse::<VisitStatus>() {
      Ok(s) => Some(s),
      Err(_) => {
        errors.push(FieldError::new("visit_status", format!("unknown status {label:?}")));
        None
      }
    },
  };

  let parsed = errors.is_empty();
  let input = VisitInput {
    teacher_id: teacher_id.unwrap_or_default(),
    supervisor_id: supervisor_id.unwrap_or_default(),
    visit_date: visit_date.unwrap_or_default(),
    school_name: text("school_name").to_owned(),
    subject: text("subject").to_owned(),
    grade: text("grade").to_owned(),
    lesson_title: text("lesson_title").to_owned(),
    management_scores: sheet(MANAGEMENT_PREFIX, MANAGEMENT_CRITERIA),
    teaching_scores: sheet(TEACHING_PREFIX, TEACHING_CRITERIA),
    feedback_scores: sheet(FEEDBACK_PREFIX, FEEDBACK_CRITERIA),
    feedback_1: optional("feedback_text_1"),
    feedback_2: optional("feedback_text_2"),
    suggestions: optional("suggestions"),
    // Without a visit date there is nothing to order the follow-up against.
    follow_up_date: follow_up_date.filter(|_| visit_date.is_some()),
    status: status.unwrap_or_default(),
    supervisor_signature: optional("supervisor_signature"),
  };
  if parsed {
    return Ok(input);
  }

  // Report the text-field problems alongside the unparseable values.
  if let Err(CoreError::Validation(more)) = input.validated() {
    errors.extend(more);
  }
  Err(ApiError::Validation(errors))
}

// ─── Replace ──────────────────────────────────────────────────────────────────

/// `PUT /visits/{id}`
pub async fn replace<S>(
  State(store): State<Arc<S>>,
  actor: Actor,
  ApiPath(id): ApiPath<Uuid>,
  headers: HeaderMap,
  ApiJson(body): ApiJson<VisitInput>,
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

  let visit = store
    .replace_visit(id, body, expected)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(visit_id = %id, by = %actor.0.username, "visit replaced");
  with_etag(StatusCode::OK, &visit)
}

// ─── Report ───────────────────────────────────────────────────────────────────

/// `GET /visits/{id}/report`
pub async fn report<S>(
  State(store): State<Arc<S>>,
  _actor: Actor,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<VisitReport>, ApiError>
where
  S: RecordStore,
{
  store
    .visit_report(id)
    .await
    .map_err(ApiError::from_store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("visit {id} not found")))
}
