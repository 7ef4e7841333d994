//! Application configuration.
//!
//! Values are loaded with priority: config.toml > environment (.env) > default.
//! Tunables that never change at runtime stay as constants.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

// ==================== Loaded Configuration ====================

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
  pub api: ApiConfig,
  pub server: ServerConfig,
  pub quiz: QuizDefaults,
  pub notifications: NotificationConfig,
  pub timer: TimerConfig,
  pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Backend REST root, e.g. `https://lumina.example.com/api`
  pub base_url: String,
  /// Hub path relative to the backend origin
  pub hub_path: String,
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:5000/api".to_string(),
      hub_path: "/notificationHub".to_string(),
      timeout_secs: 30,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub addr: String,
  pub port: u16,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      addr: SERVER_ADDR.to_string(),
      port: SERVER_PORT,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuizDefaults {
  pub question_count: usize,
  pub time_per_question_secs: u32,
  pub review_time_per_question_secs: u32,
  pub lists_per_page: u32,
}

impl Default for QuizDefaults {
  fn default() -> Self {
    Self {
      question_count: 10,
      time_per_question_secs: 30,
      review_time_per_question_secs: 30,
      lists_per_page: 9,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
  pub poll_interval_secs: u64,
  /// Delays before each reconnect attempt after a dropped connection
  pub reconnect_delays_ms: Vec<u64>,
  /// Pause before starting over once the schedule is exhausted or the
  /// first connect fails
  pub restart_delay_ms: u64,
}

impl Default for NotificationConfig {
  fn default() -> Self {
    Self {
      poll_interval_secs: 60,
      reconnect_delays_ms: vec![0, 1000, 2000, 5000, 10000],
      restart_delay_ms: 5000,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
  pub tick_ms: u64,
  pub pause_on_hidden: bool,
}

impl Default for TimerConfig {
  fn default() -> Self {
    Self {
      tick_ms: 100,
      pause_on_hidden: true,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
  pub interval_secs: u64,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self { interval_secs: 30 }
  }
}

impl AppConfig {
  pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(contents)
  }

  /// Load configuration with priority: config.toml > .env > default
  pub fn load() -> Self {
    Self::load_from(Path::new("config.toml"))
  }

  pub fn load_from(path: &Path) -> Self {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Priority 1: config.toml
    let mut config = match std::fs::read_to_string(path) {
      Ok(contents) => match Self::from_toml_str(&contents) {
        Ok(config) => {
          tracing::info!("Using configuration from {}", path.display());
          config
        }
        Err(e) => {
          tracing::warn!("Ignoring invalid {}: {}", path.display(), e);
          Self::default()
        }
      },
      Err(_) => Self::default(),
    };

    // Priority 2: environment, only for values config.toml left at default
    let defaults = Self::default();
    if config.api.base_url == defaults.api.base_url {
      if let Ok(url) = std::env::var("LUMINA_API_URL") {
        tracing::info!("Using backend from LUMINA_API_URL env: {}", url);
        config.api.base_url = url;
      }
    }
    if config.server.port == defaults.server.port {
      if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
        config.server.port = port;
      }
    }

    config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();
    tracing::info!("Backend API at {}", config.api.base_url);
    config
  }

  /// Get the full server bind address
  pub fn bind_addr(&self) -> String {
    format!("{}:{}", self.server.addr, self.server.port)
  }

  /// Backend origin (scheme + host + port) with the API path stripped.
  pub fn api_origin(&self) -> String {
    let url = self.api.base_url.as_str();
    let after_scheme = url.find("://").map(|i| i + 3).unwrap_or(0);
    match url[after_scheme..].find('/') {
      Some(i) => url[..after_scheme + i].to_string(),
      None => url.to_string(),
    }
  }

  pub fn hub_url(&self) -> String {
    format!("{}{}", self.api_origin(), self.api.hub_path)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.api.timeout_secs)
  }
}

// ==================== Server Configuration ====================

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Server port
pub const SERVER_PORT: u16 = 3000;

// ==================== Session Configuration ====================

/// Client session expiration time in hours of inactivity
pub const SESSION_EXPIRY_HOURS: i64 = 12;

/// Probability threshold for session cleanup (0-255, lower = more frequent)
/// Value of 25 means ~10% chance (25/256) on each session access
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;

/// Refresh access tokens this many seconds before they expire
pub const TOKEN_EXPIRY_SKEW_SECS: i64 = 30;

// ==================== Quiz Configuration ====================

/// Number of distractor choices in multiple choice mode
pub const DISTRACTOR_COUNT: usize = 3;

/// Answers faster than this earn the top review grade
pub const REVIEW_FAST_ANSWER_SECS: u32 = 5;

/// Answers faster than this earn the second review grade
pub const REVIEW_STEADY_ANSWER_SECS: u32 = 15;

/// Longest total-time quiz accepted from the setup form
pub const QUIZ_MAX_TOTAL_MINUTES: u32 = 180;

/// Longest per-question limit accepted from the setup form
pub const QUIZ_MAX_QUESTION_SECS: u32 = 600;

// ==================== Dashboard Configuration ====================

/// Upcoming reviews shown on the dashboard
pub const UPCOMING_DISPLAY_LIMIT: usize = 10;

/// Length of the upcoming window in days
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_without_file() {
    let config = AppConfig::from_toml_str("").unwrap();
    assert_eq!(config.quiz.question_count, 10);
    assert_eq!(config.notifications.poll_interval_secs, 60);
    assert_eq!(config.notifications.reconnect_delays_ms, vec![0, 1000, 2000, 5000, 10000]);
    assert_eq!(config.timer.tick_ms, 100);
  }

  #[test]
  fn test_partial_toml_keeps_other_defaults() {
    let config = AppConfig::from_toml_str(
      r#"
      [api]
      base_url = "https://lumina.test/api"

      [quiz]
      time_per_question_secs = 15
      "#,
    )
    .unwrap();
    assert_eq!(config.api.base_url, "https://lumina.test/api");
    assert_eq!(config.api.hub_path, "/notificationHub");
    assert_eq!(config.quiz.time_per_question_secs, 15);
    assert_eq!(config.quiz.question_count, 10);
  }

  #[test]
  fn test_hub_url_uses_origin() {
    let mut config = AppConfig::default();
    config.api.base_url = "https://lumina.test:8443/api".to_string();
    assert_eq!(config.api_origin(), "https://lumina.test:8443");
    assert_eq!(config.hub_url(), "https://lumina.test:8443/notificationHub");

    config.api.base_url = "http://localhost:5000".to_string();
    assert_eq!(config.hub_url(), "http://localhost:5000/notificationHub");
  }

  #[test]
  fn test_load_from_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::load_from(&dir.path().join("absent.toml"));
    assert_eq!(config.server.addr, SERVER_ADDR);
  }
}
