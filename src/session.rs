//! In-memory client sessions keyed by the `lumina_session` cookie.
//!
//! Each browser gets a `ClientSession` holding its current-user store, API
//! client, notification plumbing, quiz state and speaking timer. Sessions
//! auto-expire after a configurable duration of inactivity; expiry and
//! logout stop the session's background tasks.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

use crate::api::LuminaApi;
use crate::auth::AuthSession;
use crate::config::{self, AppConfig};
use crate::db::DbPool;
use crate::deck::FlashcardSession;
use crate::notifications::{Inbox, NotificationCenter};
use crate::quiz::QuizRun;
use crate::timer::{self, SpeakingTimer};

/// Lock a per-session mutex, recovering the data if a handler panicked
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  match mutex.lock() {
    Ok(guard) => guard,
    Err(poisoned) => {
      tracing::warn!("Session state mutex poisoned, recovering");
      poisoned.into_inner()
    }
  }
}

/// Flashcards for the deck currently open
pub struct OpenDeck {
  pub list_id: i64,
  pub cards: FlashcardSession,
}

pub struct ClientSession {
  id: String,
  pub auth: Arc<AuthSession>,
  pub api: LuminaApi,
  pub notifications: NotificationCenter,
  pub inbox: Arc<Mutex<Inbox>>,
  pub quiz: Mutex<Option<QuizRun>>,
  pub review: Mutex<Option<QuizRun>>,
  pub deck: Mutex<Option<OpenDeck>>,
  pub timer: Arc<SpeakingTimer>,
  timer_driver: Mutex<Option<JoinHandle<()>>>,
  /// Last user to sign in here; survives a forced sign-out
  owner: Mutex<Option<i64>>,
}

impl ClientSession {
  pub fn new(id: &str, db: DbPool, http: reqwest::Client, config: &AppConfig) -> Self {
    let auth = Arc::new(AuthSession::hydrated(id, db));
    let api = LuminaApi::new(http, &config.api.base_url, auth.clone());
    let owner = auth.current_user().map(|u| u.id);
    Self {
      id: id.to_string(),
      auth,
      api,
      notifications: NotificationCenter::new(),
      inbox: Arc::new(Mutex::new(Inbox::default())),
      quiz: Mutex::new(None),
      review: Mutex::new(None),
      deck: Mutex::new(None),
      timer: Arc::new(SpeakingTimer::system(config.timer.pause_on_hidden)),
      timer_driver: Mutex::new(None),
      owner: Mutex::new(owner),
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  /// Start the hub connection once the session has a user
  pub fn start_notifications(&self, stream_http: reqwest::Client, config: &AppConfig) {
    if self.auth.is_signed_in() {
      self
        .notifications
        .start(&self.api, stream_http, &config.hub_url(), &config.notifications, self.inbox.clone());
    }
  }

  /// Spawn the timer driver on first use
  pub fn ensure_timer_driver(&self, tick: std::time::Duration) {
    let mut driver = lock(&self.timer_driver);
    if driver.as_ref().is_some_and(|h| !h.is_finished()) {
      return;
    }
    *driver = Some(timer::spawn_driver(self.timer.clone(), tick));
  }

  /// Drop everything tied to the signed-in user
  pub fn sign_out(&self) {
    self.auth.clear();
    self.reset_user_state();
  }

  /// Record a fresh sign-in. State left behind by a different user, for
  /// example after their token refresh failed, is dropped first.
  pub fn adopt_user(&self, user_id: i64) {
    let mut owner = lock(&self.owner);
    if owner.is_some_and(|previous| previous != user_id) {
      tracing::debug!("Session {} changed user, dropping previous state", self.id);
      self.reset_user_state();
    }
    *owner = Some(user_id);
  }

  fn reset_user_state(&self) {
    self.notifications.stop();
    *lock(&self.inbox) = Inbox::default();
    *lock(&self.quiz) = None;
    *lock(&self.review) = None;
    *lock(&self.deck) = None;
    self.timer.reset();
  }

  /// Stop background tasks; state is left for the drop
  pub fn shutdown(&self) {
    self.notifications.stop();
    if let Some(handle) = lock(&self.timer_driver).take() {
      handle.abort();
    }
  }
}

impl Drop for ClientSession {
  fn drop(&mut self) {
    self.shutdown();
  }
}

/// Session entry with last access time for expiration
struct SessionEntry {
  session: Arc<ClientSession>,
  last_access: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionRegistry {
  sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
  db: DbPool,
  http: reqwest::Client,
  config: Arc<AppConfig>,
}

impl SessionRegistry {
  pub fn new(db: DbPool, http: reqwest::Client, config: Arc<AppConfig>) -> Self {
    Self {
      sessions: Arc::new(Mutex::new(HashMap::new())),
      db,
      http,
      config,
    }
  }

  /// Get or create a session for the given ID
  pub fn get_or_create(&self, session_id: &str) -> Arc<ClientSession> {
    let (session, expired) = {
      let mut sessions = lock(&self.sessions);

      // Clean up expired sessions occasionally (~10% chance)
      let expired = if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
        take_expired(&mut sessions, Utc::now())
      } else {
        Vec::new()
      };

      let session = match sessions.get_mut(session_id) {
        Some(entry) => {
          entry.last_access = Utc::now();
          entry.session.clone()
        }
        None => {
          let session = Arc::new(ClientSession::new(
            session_id,
            self.db.clone(),
            self.http.clone(),
            &self.config,
          ));
          sessions.insert(
            session_id.to_string(),
            SessionEntry {
              session: session.clone(),
              last_access: Utc::now(),
            },
          );
          tracing::debug!("Created client session ({} active)", sessions.len());
          session
        }
      };
      (session, expired)
    };

    for s in &expired {
      s.shutdown();
    }
    session
  }

  /// Existing session only
  pub fn get(&self, session_id: &str) -> Option<Arc<ClientSession>> {
    lock(&self.sessions).get(session_id).map(|e| e.session.clone())
  }

  pub fn remove(&self, session_id: &str) -> Option<Arc<ClientSession>> {
    let removed = lock(&self.sessions).remove(session_id).map(|e| e.session);
    if let Some(s) = &removed {
      s.shutdown();
    }
    removed
  }

  pub fn len(&self) -> usize {
    lock(&self.sessions).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Drop sessions idle for longer than the expiry window
  pub fn cleanup_expired(&self, now: DateTime<Utc>) -> usize {
    let expired = take_expired(&mut lock(&self.sessions), now);
    for s in &expired {
      s.shutdown();
    }
    expired.len()
  }
}

fn take_expired(sessions: &mut HashMap<String, SessionEntry>, now: DateTime<Utc>) -> Vec<Arc<ClientSession>> {
  let cutoff = now - Duration::hours(config::SESSION_EXPIRY_HOURS);
  let stale: Vec<String> = sessions
    .iter()
    .filter(|(_, e)| e.last_access <= cutoff)
    .map(|(id, _)| id.clone())
    .collect();
  stale
    .into_iter()
    .filter_map(|id| sessions.remove(&id).map(|e| e.session))
    .collect()
}

/// Generate a new session ID
pub fn generate_session_id() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}
