//! JSON REST API for the class-visit record service.
//!
//! Exposes an axum [`Router`] backed by any
//! [`classvisit_core::store::RecordStore`]. Authentication, TLS, and
//! transport concerns are the caller's responsibility; handlers expect the
//! signed-in [`classvisit_core::user::User`] in request extensions.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", classvisit_api::api_router(store.clone()))
//! ```

pub mod actor;
pub mod dashboard;
pub mod error;
pub mod etag;
pub mod extract;
pub mod supervisors;
pub mod teachers;
pub mod users;
pub mod visits;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use classvisit_core::store::RecordStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RecordStore + 'static,
{
  Router::new()
    .route("/me", get(dashboard::me))
    .route("/dashboard", get(dashboard::handler::<S>))
    // Teachers
    .route("/teachers", get(teachers::list::<S>).post(teachers::create::<S>))
    .route(
      "/teachers/{id}",
      get(teachers::get_one::<S>)
        .put(teachers::replace::<S>)
        .delete(teachers::delete::<S>),
    )
    // Supervisors
    .route(
      "/supervisors",
      get(supervisors::list::<S>).post(supervisors::create::<S>),
    )
    .route(
      "/supervisors/{id}",
      get(supervisors::get_one::<S>)
        .put(supervisors::replace::<S>)
        .delete(supervisors::delete::<S>),
    )
    // Visits
    .route("/visits", get(visits::list::<S>).post(visits::create::<S>))
    .route("/visits/form", post(visits::create_from_form::<S>))
    .route(
      "/visits/{id}",
      get(visits::get_one::<S>).put(visits::replace::<S>),
    )
    .route("/visits/{id}/report", get(visits::report::<S>))
    // Users
    .route("/users", get(users::list::<S>).post(users::create::<S>))
    .route("/users/{id}/active", post(users::set_active::<S>))
    .with_state(store)
}
