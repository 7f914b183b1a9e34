//! Extractors for the account making a request.
//!
//! The API does not authenticate. The embedding server verifies credentials
//! and inserts the signed-in [`User`] into request extensions; these
//! extractors read it back and enforce roles.

use axum::{extract::FromRequestParts, http::request::Parts};
use classvisit_core::user::User;

use crate::error::ApiError;

/// Any signed-in, active account.
pub struct Actor(pub User);

/// A signed-in account with the `admin` role.
pub struct Admin(pub User);

impl<S: Send + Sync> FromRequestParts<S> for Actor {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<User>()
      .cloned()
      .map(Actor)
      .ok_or(ApiError::Unauthorized)
  }
}

impl<S: Send + Sync> FromRequestParts<S> for Admin {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let Actor(user) = Actor::from_request_parts(parts, state).await?;
    if !user.role.is_admin() {
      tracing::warn!(username = %user.username, "admin-only request refused");
      return Err(ApiError::Forbidden("administrator access required".into()));
    }
    Ok(Admin(user))
  }
}
