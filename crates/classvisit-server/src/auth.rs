//! HTTP Basic authentication against the account table.
//!
//! [`require_user`] runs in front of the API router. On success the signed-in
//! [`User`] is inserted into request extensions, where the API's extractors
//! pick it up.

use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use classvisit_core::{
  password::{hash_password, verify_password},
  store::RecordStore,
  user::User,
};
use once_cell::sync::Lazy;

use crate::{AppState, error::Error};

/// Identifier (username or email) and password from an `Authorization`
/// header.
#[derive(Debug, PartialEq, Eq)]
pub struct Credentials {
  pub identifier: String,
  pub password:   String,
}

/// Parse `Authorization: Basic …`. Anything malformed is `Unauthorized`.
pub fn basic_credentials(headers: &HeaderMap) -> Result<Credentials, Error> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded.trim()).map_err(|_| Error::Unauthorized)?;
  let creds   = String::from_utf8(decoded).map_err(|_| Error::Unauthorized)?;

  // The password may itself contain ':'.
  let (identifier, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;
  if identifier.trim().is_empty() {
    return Err(Error::Unauthorized);
  }

  Ok(Credentials {
    identifier: identifier.trim().to_owned(),
    password:   password.to_owned(),
  })
}

/// Hash checked on the unknown-account path, so a miss costs the same argon2
/// work as a wrong password.
static DUMMY_HASH: Lazy<Option<String>> =
  Lazy::new(|| hash_password("unknown account placeholder").ok());

/// Check `creds` against the store. Unknown accounts and wrong passwords are
/// indistinguishable to the caller; a disabled account is `Inactive`.
pub async fn authenticate<S: RecordStore>(store: &S, creds: Credentials) -> Result<User, Error> {
  let found = store
    .find_user(&creds.identifier)
    .await
    .map_err(Error::store)?;

  // Argon2 verification blocks.
  let password = creds.password;
  let (verified, found) = tokio::task::spawn_blocking(move || match found {
    Some(found) => (found.verify(&password), Some(found)),
    None => {
      if let Some(dummy) = DUMMY_HASH.as_deref() {
        verify_password(&password, dummy);
      }
      (false, None)
    }
  })
  .await
  .map_err(|e| Error::Internal(e.to_string()))?;

  let Some(found) = found else {
    tracing::warn!(identifier = %creds.identifier, "login for unknown account");
    return Err(Error::Unauthorized);
  };
  if !verified {
    tracing::warn!(username = %found.user.username, "wrong password");
    return Err(Error::Unauthorized);
  }
  if !found.user.is_active {
    tracing::warn!(username = %found.user.username, "login to disabled account");
    return Err(Error::Inactive);
  }
  Ok(found.user)
}

/// Middleware: authenticate the request or answer 401/403.
pub async fn require_user<S>(
  State(state): State<AppState<S>>,
  mut request: Request,
  next: Next,
) -> Result<Response, Error>
where
  S: RecordStore + 'static,
{
  let creds = basic_credentials(request.headers())?;
  let user = authenticate(state.store.as_ref(), creds).await?;
  request.extensions_mut().insert(user);
  Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;
  use classvisit_core::{
    password::hash_password,
    user::{NewUser, Role},
  };
  use classvisit_store_sqlite::SqliteStore;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    map
  }

  fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  fn creds(identifier: &str, password: &str) -> Credentials {
    Credentials { identifier: identifier.into(), password: password.into() }
  }

  async fn store_with(username: &str, password: &str, active: bool) -> SqliteStore {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store
      .add_user(NewUser {
        username:      username.into(),
        email:         format!("{username}@school.sa"),
        name:          username.into(),
        role:          Role::Supervisor,
        password_hash: hash_password(password).unwrap(),
        is_active:     active,
      })
      .await
      .unwrap();
    store
  }

  #[test]
  fn parses_basic_credentials() {
    let parsed = basic_credentials(&headers(&basic("ali", "pa:ss"))).unwrap();
    assert_eq!(parsed, creds("ali", "pa:ss"));
  }

  #[test]
  fn missing_header() {
    assert!(matches!(basic_credentials(&HeaderMap::new()), Err(Error::Unauthorized)));
  }

  #[test]
  fn invalid_base64() {
    let result = basic_credentials(&headers("Basic !!!not-base64!!!"));
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn other_schemes_are_rejected() {
    let result = basic_credentials(&headers("Bearer abc"));
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn missing_colon() {
    let header = format!("Basic {}", B64.encode("justauser"));
    assert!(matches!(basic_credentials(&headers(&header)), Err(Error::Unauthorized)));
  }

  #[tokio::test]
  async fn correct_password_by_username_or_email() {
    let store = store_with("ali", "secret", true).await;
    let user = authenticate(&store, creds("ali", "secret")).await.unwrap();
    assert_eq!(user.username, "ali");
    let user = authenticate(&store, creds("ALI@school.sa", "secret")).await.unwrap();
    assert_eq!(user.username, "ali");
  }

  #[tokio::test]
  async fn wrong_password() {
    let store = store_with("ali", "secret", true).await;
    let result = authenticate(&store, creds("ali", "wrong")).await;
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[tokio::test]
  async fn unknown_account() {
    let store = store_with("ali", "secret", true).await;
    let result = authenticate(&store, creds("omar", "secret")).await;
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn unknown_accounts_verify_against_a_real_hash() {
    let dummy = DUMMY_HASH.as_deref().unwrap();
    assert!(classvisit_core::password::is_phc_string(dummy));
    assert!(!verify_password("secret", dummy));
  }

  #[tokio::test]
  async fn disabled_account() {
    let store = store_with("ali", "secret", false).await;
    let result = authenticate(&store, creds("ali", "secret")).await;
    assert!(matches!(result, Err(Error::Inactive)));
  }
}
