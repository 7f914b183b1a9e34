//! Handlers for `/users` endpoints. All of them require an admin.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users` | Ordered by username |
//! | `POST` | `/users` | Body: [`NewUserBody`]; the password is hashed here |
//! | `POST` | `/users/{id}/active` | Body: `{"active": false}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use classvisit_core::{
  FieldError,
  password::hash_password,
  store::RecordStore,
  user::{NewUser, Role, User},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  actor::Admin,
  error::ApiError,
  extract::{ApiJson, ApiPath},
};

/// `GET /users`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  _admin: Admin,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: RecordStore,
{
  let users = store.list_users().await.map_err(ApiError::from_store)?;
  Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct NewUserBody {
  pub username:  String,
  pub email:     String,
  pub name:      String,
  #[serde(default)]
  pub role:      Role,
  /// Plaintext; never stored.
  pub password:  String,
  #[serde(default = "default_active")]
  pub is_active: bool,
}

fn default_active() -> bool { true }

/// `POST /users`: returns 201 + the stored [`User`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Admin(admin): Admin,
  ApiJson(body): ApiJson<NewUserBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
{
  if body.password.is_empty() {
    return Err(ApiError::Validation(vec![FieldError::new(
      "password",
      "is required",
    )]));
  }

  let password = body.password;
  let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

  let user = store
    .add_user(NewUser {
      username: body.username,
      email: body.email,
      name: body.name,
      role: body.role,
      password_hash,
      is_active: body.is_active,
    })
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(
    username = %user.username,
    role = user.role.as_str(),
    by = %admin.username,
    "user created"
  );
  Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
pub struct ActiveBody {
  pub active: bool,
}

/// `POST /users/{id}/active`
pub async fn set_active<S>(
  State(store): State<Arc<S>>,
  Admin(admin): Admin,
  ApiPath(id): ApiPath<Uuid>,
  ApiJson(body): ApiJson<ActiveBody>,
) -> Result<Json<User>, ApiError>
where
  S: RecordStore,
{
  if id == admin.user_id && !body.active {
    return Err(ApiError::Conflict("an administrator cannot deactivate their own account".into()));
  }
  let user = store
    .set_user_active(id, body.active)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(username = %user.username, active = body.active, by = %admin.username, "account status changed");
  Ok(Json(user))
}
