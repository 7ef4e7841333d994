//! Application state shared by all handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::api::{self, LuminaApi};
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::session::SessionRegistry;
use crate::sync::ApiResolver;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>,

  /// Client-side SQLite store (persisted session keys, offline queue)
  pub db: DbPool,

  /// REST client with the request timeout applied
  pub http: reqwest::Client,

  /// Client for the notification hub stream
  pub stream_http: reqwest::Client,

  pub sessions: SessionRegistry,
}

impl AppState {
  pub fn new(config: AppConfig, db: DbPool) -> Self {
    let config = Arc::new(config);
    let http = api::build_http_client(config.request_timeout());
    let stream_http = api::build_stream_client(config.request_timeout());
    let sessions = SessionRegistry::new(db.clone(), http.clone(), config.clone());
    Self {
      config,
      db,
      http,
      stream_http,
      sessions,
    }
  }

  pub fn timer_tick(&self) -> Duration {
    Duration::from_millis(self.config.timer.tick_ms.max(10))
  }

  pub fn sync_interval(&self) -> Duration {
    Duration::from_secs(self.config.sync.interval_secs.max(1))
  }

  /// API lookup for the offline queue worker: only live sessions flush
  pub fn api_resolver(&self) -> ApiResolver {
    let sessions = self.sessions.clone();
    Arc::new(move |id: &str| -> Option<LuminaApi> { sessions.get(id).map(|s| s.api.clone()) })
  }
}
