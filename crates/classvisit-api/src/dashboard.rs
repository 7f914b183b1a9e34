//! Handlers for `/dashboard` and `/me`.

use std::sync::Arc;

use axum::{Json, extract::State};
use classvisit_core::{report::Dashboard, store::RecordStore, user::User};

use crate::{actor::Actor, error::ApiError};

/// `GET /dashboard`: visit, teacher, and supervisor counts plus the most
/// recent visits.
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  _actor: Actor,
) -> Result<Json<Dashboard>, ApiError>
where
  S: RecordStore,
{
  let dashboard = store.dashboard().await.map_err(ApiError::from_store)?;
  Ok(Json(dashboard))
}

/// `GET /me`: the signed-in account.
pub async fn me(Actor(user): Actor) -> Json<User> { Json(user) }
