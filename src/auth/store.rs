//! Current-user store.
//!
//! `AuthSession` is the only writer of a client session's credentials and
//! cached user. It hydrates from local storage when the session is created,
//! is replaced on login and is wiped on logout. Readers subscribe to the
//! watch channel instead of polling storage.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::sync::Mutex;
use tokio::sync::watch;

use crate::config::TOKEN_EXPIRY_SKEW_SECS;
use crate::db::{self, DbPool, LogOnError};
use crate::domain::{AuthUser, LoginResponse};

pub const TOKEN_KEY: &str = "lumina_token";
pub const REFRESH_TOKEN_KEY: &str = "lumina_refresh_token";
pub const EXPIRES_AT_KEY: &str = "lumina_token_expires_at";
pub const USER_KEY: &str = "lumina_user";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Credentials {
  token: String,
  refresh_token: Option<String>,
  expires_at: Option<DateTime<Utc>>,
}

pub struct AuthSession {
  session_id: String,
  storage: Option<DbPool>,
  credentials: Mutex<Option<Credentials>>,
  user: watch::Sender<Option<AuthUser>>,
}

impl AuthSession {
  /// Store without persistence
  pub fn detached() -> Self {
    Self::new("detached", None)
  }

  pub fn new(session_id: &str, storage: Option<DbPool>) -> Self {
    let (user, _) = watch::channel(None);
    Self {
      session_id: session_id.to_string(),
      storage,
      credentials: Mutex::new(None),
      user,
    }
  }

  /// Create the store and load any credentials left by an earlier visit
  pub fn hydrated(session_id: &str, storage: DbPool) -> Self {
    let session = Self::new(session_id, Some(storage));
    session.hydrate(Utc::now());
    session
  }

  pub fn hydrate(&self, now: DateTime<Utc>) {
    let Some(pool) = &self.storage else { return };
    let loaded = {
      let Some(conn) = db::try_lock(pool).log_warn("hydrate auth") else {
        return;
      };
      let token = db::get_value(&conn, &self.session_id, TOKEN_KEY).log_warn_default("read token");
      let refresh =
        db::get_value(&conn, &self.session_id, REFRESH_TOKEN_KEY).log_warn_default("read refresh token");
      let expires = db::get_value(&conn, &self.session_id, EXPIRES_AT_KEY)
        .log_warn_default("read token expiry")
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|d| d.with_timezone(&Utc));
      let user: Option<AuthUser> =
        db::get_json(&conn, &self.session_id, USER_KEY).log_warn_default("read cached user");
      token.zip(user).map(|(token, user)| {
        (
          Credentials {
            token,
            refresh_token: refresh,
            expires_at: expires,
          },
          user,
        )
      })
    };

    let Some((creds, user)) = loaded else { return };
    let expired = creds.expires_at.is_some_and(|at| at <= now);
    if expired && creds.refresh_token.is_none() {
      tracing::debug!("Stored token for session {} expired, clearing", self.session_id);
      self.clear();
      return;
    }

    tracing::debug!(
      "Hydrated session {} for user {} (token {})",
      self.session_id,
      user.username,
      fingerprint(&creds.token)
    );
    self.set_credentials(Some(creds));
    self.user.send_replace(Some(user));
  }

  /// Adopt a fresh login or refresh response
  pub fn establish(&self, response: &LoginResponse, now: DateTime<Utc>) {
    let expires_at = (response.expires_in > 0).then(|| now + Duration::seconds(response.expires_in));
    // A refresh response may omit the refresh token; keep the one we have,
    // but only for the same user.
    let same_user = self.current_user().is_some_and(|u| u.id == response.user.id);
    let refresh_token = response
      .refresh_token
      .clone()
      .or_else(|| same_user.then(|| self.refresh_token()).flatten());
    let creds = Credentials {
      token: response.token.clone(),
      refresh_token,
      expires_at,
    };

    if let Some(pool) = &self.storage {
      if let Some(conn) = db::try_lock(pool).log_warn("persist auth") {
        db::set_value(&conn, &self.session_id, TOKEN_KEY, &creds.token).log_warn("persist token");
        match &creds.refresh_token {
          Some(rt) => db::set_value(&conn, &self.session_id, REFRESH_TOKEN_KEY, rt),
          None => db::remove_value(&conn, &self.session_id, REFRESH_TOKEN_KEY),
        }
        .log_warn("persist refresh token");
        match expires_at {
          Some(at) => db::set_value(&conn, &self.session_id, EXPIRES_AT_KEY, &at.to_rfc3339()),
          None => db::remove_value(&conn, &self.session_id, EXPIRES_AT_KEY),
        }
        .log_warn("persist token expiry");
        db::set_json(&conn, &self.session_id, USER_KEY, &response.user).log_warn("persist user");
      }
    }

    tracing::info!(
      "Signed in as {} (token {})",
      response.user.username,
      fingerprint(&creds.token)
    );
    self.set_credentials(Some(creds));
    self.user.send_replace(Some(response.user.clone()));
  }

  /// Log out: forget credentials everywhere and publish `None`
  pub fn clear(&self) {
    if let Some(pool) = &self.storage {
      if let Some(conn) = db::try_lock(pool).log_warn("clear auth") {
        for key in [TOKEN_KEY, REFRESH_TOKEN_KEY, EXPIRES_AT_KEY, USER_KEY] {
          db::remove_value(&conn, &self.session_id, key).log_warn("remove auth key");
        }
      }
    }
    self.set_credentials(None);
    self.user.send_replace(None);
  }

  pub fn token(&self) -> Option<String> {
    self.read_credentials().map(|c| c.token)
  }

  pub fn refresh_token(&self) -> Option<String> {
    self.read_credentials().and_then(|c| c.refresh_token)
  }

  pub fn expires_at(&self) -> Option<DateTime<Utc>> {
    self.read_credentials().and_then(|c| c.expires_at)
  }

  /// True when the token is about to expire and can be refreshed
  pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
    match self.read_credentials() {
      Some(Credentials {
        refresh_token: Some(_),
        expires_at: Some(at),
        ..
      }) => at - Duration::seconds(TOKEN_EXPIRY_SKEW_SECS) <= now,
      _ => false,
    }
  }

  pub fn current_user(&self) -> Option<AuthUser> {
    self.user.borrow().clone()
  }

  pub fn is_signed_in(&self) -> bool {
    self.read_credentials().is_some()
  }

  pub fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
    self.user.subscribe()
  }

  pub fn session_id(&self) -> &str {
    &self.session_id
  }

  fn read_credentials(&self) -> Option<Credentials> {
    match self.credentials.lock() {
      Ok(guard) => guard.clone(),
      Err(poisoned) => poisoned.into_inner().clone(),
    }
  }

  fn set_credentials(&self, creds: Option<Credentials>) {
    match self.credentials.lock() {
      Ok(mut guard) => *guard = creds,
      Err(poisoned) => *poisoned.into_inner() = creds,
    }
  }
}

/// Short, non-reversible token tag for log lines
pub fn fingerprint(token: &str) -> String {
  let digest = Sha256::digest(token.as_bytes());
  hex::encode(&digest[..4])
}
