//! HTTP front end for the class-visit record service.
//!
//! Wraps the JSON API from [`classvisit_api`] with HTTP Basic
//! authentication, request tracing, and the runtime configuration read by
//! the `classvisit-server` binary.

pub mod auth;
pub mod bootstrap;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use classvisit_core::store::RecordStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CLASSVISIT_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  /// SQLite database file. A leading `~/` is expanded by the binary.
  pub store_path:          PathBuf,
  /// Bootstrap administrator; see [`bootstrap::AdminAccount`].
  pub admin_username:      Option<String>,
  pub admin_email:         Option<String>,
  pub admin_name:          Option<String>,
  /// Argon2 PHC string, as printed by `--hash-password`.
  pub admin_password_hash: Option<String>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                "127.0.0.1".to_string(),
      port:                8080,
      store_path:          PathBuf::from("classvisit.db"),
      admin_username:      None,
      admin_email:         None,
      admin_name:          None,
      admin_password_hash: None,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state for the auth middleware.
pub struct AppState<S> {
  pub store: Arc<S>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the service router: `/health` is open, everything under `/api`
/// requires HTTP Basic credentials.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordStore + 'static,
{
  let api = classvisit_api::api_router(state.store.clone())
    .layer(middleware::from_fn_with_state(state, auth::require_user::<S>));

  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
