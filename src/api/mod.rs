//! Typed client for the Lumina REST backend.
//!
//! Every call goes through [`LuminaApi::execute`], which attaches the bearer
//! token, refreshes it shortly before expiry, and on a 401 refreshes once and
//! retries once. A second 401 (or a failed refresh) logs the session out.

pub mod auth;
pub mod notifications;
pub mod quota;
pub mod repetition;
pub mod vocabulary;

use chrono::Utc;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::auth::{AuthSession, fingerprint};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
  /// Transport failure, no HTTP status (status 0)
  #[error("network error: {0}")]
  Network(String),
  #[error("not signed in")]
  NotSignedIn,
  #[error("unauthorized")]
  Unauthorized,
  #[error("forbidden: {0}")]
  Forbidden(String),
  #[error("not found: {0}")]
  NotFound(String),
  #[error("server error {status}: {message}")]
  Server { status: u16, message: String },
  #[error("HTTP {status}: {message}")]
  Status { status: u16, message: String },
  #[error("unexpected response: {0}")]
  Decode(String),
}

impl ApiError {
  pub fn from_status(status: StatusCode, message: String) -> Self {
    match status.as_u16() {
      401 => Self::Unauthorized,
      403 => Self::Forbidden(message),
      404 => Self::NotFound(message),
      s if s >= 500 => Self::Server { status: s, message },
      s => Self::Status { status: s, message },
    }
  }

  /// HTTP status, 0 for transport failures
  pub fn status(&self) -> u16 {
    match self {
      Self::Network(_) => 0,
      Self::NotSignedIn | Self::Unauthorized => 401,
      Self::Forbidden(_) => 403,
      Self::NotFound(_) => 404,
      Self::Server { status, .. } | Self::Status { status, .. } => *status,
      Self::Decode(_) => 200,
    }
  }

  pub fn is_network(&self) -> bool {
    matches!(self, Self::Network(_))
  }

  pub fn is_auth(&self) -> bool {
    matches!(self, Self::NotSignedIn | Self::Unauthorized)
  }

  /// Message suitable for showing next to the failed action
  pub fn user_message(&self) -> String {
    match self {
      Self::Network(_) => "Cannot reach the server. Check your connection.".to_string(),
      Self::NotSignedIn | Self::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
      Self::Forbidden(m) | Self::NotFound(m) if !m.is_empty() => m.clone(),
      Self::Forbidden(_) => "You do not have access to this.".to_string(),
      Self::NotFound(_) => "Not found.".to_string(),
      Self::Server { message, .. } | Self::Status { message, .. } if !message.is_empty() => {
        message.clone()
      }
      Self::Server { .. } | Self::Status { .. } => "The server could not complete the request.".to_string(),
      Self::Decode(_) => "The server sent an unexpected response.".to_string(),
    }
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      Self::Decode(e.to_string())
    } else if let Some(status) = e.status() {
      Self::from_status(status, e.to_string())
    } else {
      Self::Network(e.to_string())
    }
  }
}

/// Error body shapes the backend uses
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
  #[serde(default)]
  message: Option<String>,
  #[serde(default)]
  title: Option<String>,
}

/// Build the shared HTTP client
pub fn build_http_client(timeout: std::time::Duration) -> reqwest::Client {
  reqwest::Client::builder()
    .timeout(timeout)
    .build()
    .unwrap_or_else(|_| reqwest::Client::new())
}

/// Client for long-lived streams: only the connect phase is bounded
pub fn build_stream_client(connect_timeout: std::time::Duration) -> reqwest::Client {
  reqwest::Client::builder()
    .connect_timeout(connect_timeout)
    .build()
    .unwrap_or_else(|_| reqwest::Client::new())
}

#[derive(Clone)]
pub struct LuminaApi {
  http: reqwest::Client,
  base_url: String,
  auth: Arc<AuthSession>,
  refresh_lock: Arc<tokio::sync::Mutex<()>>,
}

impl LuminaApi {
  pub fn new(http: reqwest::Client, base_url: &str, auth: Arc<AuthSession>) -> Self {
    Self {
      http,
      base_url: base_url.trim_end_matches('/').to_string(),
      auth,
      refresh_lock: Arc::new(tokio::sync::Mutex::new(())),
    }
  }

  pub fn auth(&self) -> &Arc<AuthSession> {
    &self.auth
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  pub fn http(&self) -> &reqwest::Client {
    &self.http
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  fn build<B: Serialize + ?Sized>(
    &self,
    method: &Method,
    path: &str,
    query: &[(&str, String)],
    body: Option<&B>,
    token: Option<&str>,
  ) -> RequestBuilder {
    let mut req = self.http.request(method.clone(), self.url(path));
    if !query.is_empty() {
      req = req.query(query);
    }
    if let Some(body) = body {
      req = req.json(body);
    }
    if let Some(token) = token {
      req = req.bearer_auth(token);
    }
    req
  }

  /// Send an authenticated request, refreshing once on 401
  async fn execute<B: Serialize + ?Sized>(
    &self,
    method: Method,
    path: &str,
    query: &[(&str, String)],
    body: Option<&B>,
  ) -> Result<Response, ApiError> {
    if self.auth.needs_refresh(Utc::now()) {
      let stale = self.auth.token();
      if let Err(e) = self.refresh_if_current(stale.as_deref()).await {
        tracing::warn!("Proactive token refresh failed: {}", e);
      }
    }

    let token = self.auth.token().ok_or(ApiError::NotSignedIn)?;
    let resp = self.build(&method, path, query, body, Some(&token)).send().await?;
    if resp.status() != StatusCode::UNAUTHORIZED {
      return Ok(resp);
    }

    tracing::debug!("{} {} returned 401 (token {}), refreshing", method, path, fingerprint(&token));
    if let Err(e) = self.refresh_if_current(Some(&token)).await {
      tracing::info!("Token refresh failed, signing out: {}", e);
      self.auth.clear();
      return Err(ApiError::Unauthorized);
    }

    let token = self.auth.token().ok_or(ApiError::NotSignedIn)?;
    let resp = self.build(&method, path, query, body, Some(&token)).send().await?;
    if resp.status() == StatusCode::UNAUTHORIZED {
      tracing::info!("Retry after refresh still unauthorized, signing out");
      self.auth.clear();
      return Err(ApiError::Unauthorized);
    }
    Ok(resp)
  }

  /// Refresh unless another request already replaced `stale`
  async fn refresh_if_current(&self, stale: Option<&str>) -> Result<(), ApiError> {
    let _guard = self.refresh_lock.lock().await;
    let current = self.auth.token();
    if current.is_some() && current.as_deref() != stale {
      return Ok(());
    }
    self.refresh().await
  }

  async fn execute_anonymous<B: Serialize + ?Sized>(
    &self,
    method: Method,
    path: &str,
    body: Option<&B>,
  ) -> Result<Response, ApiError> {
    Ok(self.build(&method, path, &[], body, None).send().await?)
  }

  async fn check(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
      .ok()
      .and_then(|b| b.message.or(b.title))
      .unwrap_or(text);
    Err(ApiError::from_status(status, message))
  }

  async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let resp = Self::check(resp).await?;
    let text = resp.text().await?;
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
  }

  pub(crate) async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T, ApiError> {
    let resp = self.execute::<()>(Method::GET, path, query, None).await?;
    Self::decode(resp).await
  }

  pub(crate) async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
    &self,
    method: Method,
    path: &str,
    body: Option<&B>,
  ) -> Result<T, ApiError> {
    let resp = self.execute(method, path, &[], body).await?;
    Self::decode(resp).await
  }

  /// Request whose response body is ignored
  pub(crate) async fn send_empty<B: Serialize + ?Sized>(
    &self,
    method: Method,
    path: &str,
    body: Option<&B>,
  ) -> Result<(), ApiError> {
    let resp = self.execute(method, path, &[], body).await?;
    Self::check(resp).await.map(|_| ())
  }
}
