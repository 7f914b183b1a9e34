//! Service accounts and their roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result, password,
  validate::{Checker, trim},
};

/// What an account may do. Only admins manage the teacher and supervisor
/// directories and other accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  #[default]
  Supervisor,
  Teacher,
}

impl Role {
  pub fn is_admin(self) -> bool { matches!(self, Self::Admin) }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Admin => "admin",
      Self::Supervisor => "supervisor",
      Self::Teacher => "teacher",
    }
  }
}

impl std::str::FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "admin" => Ok(Self::Admin),
      "supervisor" => Ok(Self::Supervisor),
      "teacher" => Ok(Self::Teacher),
      other => Err(Error::invalid("role", format!("unknown role {other:?}"))),
    }
  }
}

/// An account as exposed to callers. The credential hash never leaves the
/// store except inside [`UserCredentials`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub username:   String,
  pub email:      String,
  pub name:       String,
  pub role:       Role,
  pub is_active:  bool,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::RecordStore::add_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub email:         String,
  pub name:          String,
  pub role:          Role,
  /// Argon2 PHC string; see [`password::hash_password`].
  pub password_hash: String,
  pub is_active:     bool,
}

impl NewUser {
  pub const MAX_USERNAME: usize = 80;
  pub const MAX_EMAIL: usize = 120;
  pub const MAX_NAME: usize = 100;

  /// Trim the text fields and check them.
  pub fn validated(self) -> Result<Self> {
    let user = Self {
      username: trim(self.username),
      email: trim(self.email),
      name: trim(self.name),
      ..self
    };
    Checker::new()
      .required("username", &user.username, Self::MAX_USERNAME)
      .email("email", &user.email, Self::MAX_EMAIL)
      .required("name", &user.name, Self::MAX_NAME)
      .check(
        "password_hash",
        password::is_phc_string(&user.password_hash),
        "is not a password hash",
      )
      .finish()?;
    Ok(user)
  }
}

/// A user together with the stored credential hash. Returned only by
/// identifier lookup, for login checks.
#[derive(Debug, Clone)]
pub struct UserCredentials {
  pub user:          User,
  pub password_hash: String,
}

impl UserCredentials {
  pub fn verify(&self, password: &str) -> bool {
    password::verify_password(password, &self.password_hash)
  }
}
