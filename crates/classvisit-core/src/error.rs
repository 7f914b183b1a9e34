//! Error types for `classvisit-core`.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// The kinds of record the service stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
  User,
  Teacher,
  Supervisor,
  Visit,
}

impl fmt::Display for Entity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::User => "user",
      Self::Teacher => "teacher",
      Self::Supervisor => "supervisor",
      Self::Visit => "visit",
    })
  }
}

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:   &'static str,
  pub message: String,
}

impl FieldError {
  pub fn new(field: &'static str, message: impl Into<String>) -> Self {
    Self { field, message: message.into() }
  }
}

impl fmt::Display for FieldError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.field, self.message)
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("{entity} not found: {id}")]
  NotFound { entity: Entity, id: Uuid },

  /// A unique constraint (email, username) would be violated.
  #[error("conflict: {0}")]
  Conflict(String),

  /// Delete refused because visits still reference the record.
  #[error("{entity} {id} is referenced by {visits} visit(s)")]
  InUse {
    entity: Entity,
    id:     Uuid,
    visits: u64,
  },

  /// A conditional replace found the record changed since it was read.
  #[error("{entity} {id} changed since it was read")]
  Stale { entity: Entity, id: Uuid },

  #[error("invalid input: {}", join_fields(.0))]
  Validation(Vec<FieldError>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("password hash error: {0}")]
  PasswordHash(String),
}

impl Error {
  pub fn not_found(entity: Entity, id: Uuid) -> Self {
    Self::NotFound { entity, id }
  }

  pub fn stale(entity: Entity, id: Uuid) -> Self { Self::Stale { entity, id } }

  pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation(vec![FieldError::new(field, message)])
  }
}

fn join_fields(errors: &[FieldError]) -> String {
  errors
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("; ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by storage backend errors so higher layers can recover the
/// domain error (not found, conflict, ...) behind a backend-specific type.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// The domain error this backend error carries, if any.
  fn domain(&self) -> Option<&Error>;
}

impl StoreError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}
