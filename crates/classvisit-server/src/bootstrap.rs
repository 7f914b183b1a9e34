//! Startup bootstrap: make sure the configured administrator exists.

use classvisit_core::{
  StoreError,
  store::RecordStore,
  user::{NewUser, Role},
};

use crate::{ServerConfig, error::Error};

/// The administrator account described by the `admin_*` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAccount {
  pub username:      String,
  pub email:         String,
  pub name:          String,
  pub password_hash: String,
}

impl AdminAccount {
  /// `None` when no admin settings are present. Username, email, and hash
  /// must be given together; the display name falls back to the username.
  pub fn from_config(config: &ServerConfig) -> Result<Option<Self>, Error> {
    match (
      &config.admin_username,
      &config.admin_email,
      &config.admin_password_hash,
    ) {
      (None, None, None) => Ok(None),
      (Some(username), Some(email), Some(password_hash)) => Ok(Some(Self {
        username:      username.clone(),
        email:         email.clone(),
        name:          config.admin_name.clone().unwrap_or_else(|| username.clone()),
        password_hash: password_hash.clone(),
      })),
      _ => Err(Error::Config(
        "admin_username, admin_email and admin_password_hash must be set together".into(),
      )),
    }
  }
}

/// Create `account` unless a user with its username or email already
/// exists. Returns whether an account was created.
pub async fn ensure_admin<S: RecordStore>(store: &S, account: &AdminAccount) -> Result<bool, Error> {
  for identifier in [&account.username, &account.email] {
    if let Some(existing) = store.find_user(identifier).await.map_err(Error::store)? {
      if !existing.user.role.is_admin() {
        tracing::warn!(
          username = %existing.user.username,
          "configured admin identifier belongs to a non-admin account"
        );
      }
      return Ok(false);
    }
  }

  let created = store
    .add_user(NewUser {
      username:      account.username.clone(),
      email:         account.email.clone(),
      name:          account.name.clone(),
      role:          Role::Admin,
      password_hash: account.password_hash.clone(),
      is_active:     true,
    })
    .await
    .map_err(|e| match e.domain().map(ToString::to_string) {
      Some(reason) => Error::Config(format!("admin account: {reason}")),
      None => Error::store(e),
    })?;

  tracing::info!(username = %created.username, "created administrator account");
  Ok(true)
}
