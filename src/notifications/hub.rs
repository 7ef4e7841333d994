//! Real-time notification channel.
//!
//! The hub streams server-sent events whose data fields carry JSON hub
//! messages terminated by the 0x1E record separator. Invocations of
//! `ReceiveNotification` bump the unread counter and are re-broadcast to
//! in-process subscribers.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use super::inbox::UnreadCounter;
use crate::auth::{AuthSession, fingerprint};
use crate::config::NotificationConfig;
use crate::domain::RealtimeNotification;

pub const RECORD_SEPARATOR: char = '\u{1e}';
pub const RECEIVE_NOTIFICATION: &str = "ReceiveNotification";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubState {
  Disconnected,
  Connecting,
  Connected,
  Reconnecting,
}

impl HubState {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Disconnected => "disconnected",
      Self::Connecting => "connecting",
      Self::Connected => "connected",
      Self::Reconnecting => "reconnecting",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HubMessage {
  Notification(RealtimeNotification),
  Ping,
  Close { error: Option<String> },
  /// Invocation of a target this client does not handle
  Other,
}

#[derive(Deserialize)]
struct Envelope {
  #[serde(rename = "type")]
  kind: u8,
  #[serde(default)]
  target: Option<String>,
  #[serde(default)]
  error: Option<String>,
}

#[derive(Deserialize)]
struct NotificationInvocation {
  arguments: (RealtimeNotification,),
}

pub fn parse_hub_message(raw: &str) -> Result<HubMessage, serde_json::Error> {
  let envelope: Envelope = serde_json::from_str(raw)?;
  Ok(match envelope.kind {
    1 if envelope.target.as_deref() == Some(RECEIVE_NOTIFICATION) => {
      let invocation: NotificationInvocation = serde_json::from_str(raw)?;
      HubMessage::Notification(invocation.arguments.0)
    }
    6 => HubMessage::Ping,
    7 => HubMessage::Close {
      error: envelope.error,
    },
    _ => HubMessage::Other,
  })
}

/// Split one SSE data payload into hub messages
pub fn parse_hub_payload(payload: &str) -> Vec<Result<HubMessage, serde_json::Error>> {
  payload
    .split(RECORD_SEPARATOR)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(parse_hub_message)
    .collect()
}

/// Incremental `text/event-stream` decoder yielding each event's data
#[derive(Debug, Default)]
pub struct SseDecoder {
  buf: Vec<u8>,
}

impl SseDecoder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
    self.buf.extend(chunk.iter().filter(|b| **b != b'\r'));
    let mut events = Vec::new();
    while let Some(end) = self.buf.windows(2).position(|w| w == b"\n\n") {
      let raw: Vec<u8> = self.buf.drain(..end + 2).collect();
      let text = String::from_utf8_lossy(&raw[..end]);
      let data: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|d| d.strip_prefix(' ').unwrap_or(d))
        .collect();
      if !data.is_empty() {
        events.push(data.join("\n"));
      }
    }
    events
  }
}

/// Delays between reconnect attempts
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
  delays: Vec<Duration>,
  restart: Duration,
  attempt: usize,
}

impl ReconnectPolicy {
  pub fn new(delays: Vec<Duration>, restart: Duration) -> Self {
    Self {
      delays,
      restart,
      attempt: 0,
    }
  }

  pub fn from_config(config: &NotificationConfig) -> Self {
    Self::new(
      config
        .reconnect_delays_ms
        .iter()
        .map(|ms| Duration::from_millis(*ms))
        .collect(),
      Duration::from_millis(config.restart_delay_ms),
    )
  }

  /// Next reconnect delay, or `None` once the schedule is used up. The
  /// schedule rewinds after returning `None`.
  pub fn next_delay(&mut self) -> Option<Duration> {
    match self.delays.get(self.attempt) {
      Some(delay) => {
        self.attempt += 1;
        Some(*delay)
      }
      None => {
        self.attempt = 0;
        None
      }
    }
  }

  pub fn restart_delay(&self) -> Duration {
    self.restart
  }

  pub fn reset(&mut self) {
    self.attempt = 0;
  }
}

#[derive(Debug, thiserror::Error)]
pub enum HubError {
  #[error("not signed in")]
  NotSignedIn,
  #[error("hub connect failed: {0}")]
  Connect(String),
  #[error("hub returned HTTP {0}")]
  Status(u16),
}

/// Running hub connection. Dropping the handle also stops the task.
pub struct HubHandle {
  state: watch::Receiver<HubState>,
  shutdown: watch::Sender<bool>,
  task: JoinHandle<()>,
}

impl HubHandle {
  pub fn state(&self) -> HubState {
    *self.state.borrow()
  }

  pub fn subscribe_state(&self) -> watch::Receiver<HubState> {
    self.state.clone()
  }

  pub fn stop(&self) {
    let _ = self.shutdown.send(true);
  }

  pub fn is_finished(&self) -> bool {
    self.task.is_finished()
  }

  pub async fn join(self) {
    self.stop();
    let _ = self.task.await;
  }
}

pub struct HubClient {
  http: reqwest::Client,
  url: String,
  auth: Arc<AuthSession>,
  unread: UnreadCounter,
  feed: broadcast::Sender<RealtimeNotification>,
  policy: ReconnectPolicy,
}

enum StreamEnd {
  Dropped,
  Shutdown,
}

impl HubClient {
  pub fn new(
    http: reqwest::Client,
    url: &str,
    auth: Arc<AuthSession>,
    unread: UnreadCounter,
    feed: broadcast::Sender<RealtimeNotification>,
    policy: ReconnectPolicy,
  ) -> Self {
    Self {
      http,
      url: url.to_string(),
      auth,
      unread,
      feed,
      policy,
    }
  }

  pub fn spawn(self) -> HubHandle {
    let (state_tx, state) = watch::channel(HubState::Disconnected);
    let (shutdown, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(self.run(state_tx, shutdown_rx));
    HubHandle {
      state,
      shutdown,
      task,
    }
  }

  async fn connect(&self) -> Result<reqwest::Response, HubError> {
    let token = self.auth.token().ok_or(HubError::NotSignedIn)?;
    let url = format!("{}?access_token={}", self.url, urlencoding::encode(&token));
    tracing::debug!("Connecting to hub {} (token {})", self.url, fingerprint(&token));
    let resp = self
      .http
      .get(url)
      .header(reqwest::header::ACCEPT, "text/event-stream")
      .send()
      .await
      .map_err(|e| HubError::Connect(e.to_string()))?;
    if !resp.status().is_success() {
      return Err(HubError::Status(resp.status().as_u16()));
    }
    Ok(resp)
  }

  async fn read_stream(&self, mut resp: reqwest::Response, shutdown: &mut watch::Receiver<bool>) -> StreamEnd {
    let mut decoder = SseDecoder::new();
    loop {
      let chunk = tokio::select! {
        chunk = resp.chunk() => chunk,
        _ = shutdown.changed() => return StreamEnd::Shutdown,
      };
      let bytes = match chunk {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return StreamEnd::Dropped,
        Err(e) => {
          tracing::debug!("Hub stream error: {}", e);
          return StreamEnd::Dropped;
        }
      };
      for payload in decoder.push(&bytes) {
        for message in parse_hub_payload(&payload) {
          match message {
            Ok(HubMessage::Notification(n)) => {
              tracing::debug!("Realtime notification {}: {}", n.notification_id, n.title);
              self.unread.increment();
              let _ = self.feed.send(n);
            }
            Ok(HubMessage::Close { error }) => {
              tracing::info!("Hub closed the connection: {}", error.as_deref().unwrap_or("no reason"));
              return StreamEnd::Dropped;
            }
            Ok(HubMessage::Ping | HubMessage::Other) => {}
            Err(e) => tracing::warn!("Ignoring malformed hub message: {}", e),
          }
        }
      }
    }
  }

  async fn run(mut self, state: watch::Sender<HubState>, mut shutdown: watch::Receiver<bool>) {
    let mut reconnecting = false;
    loop {
      if *shutdown.borrow() {
        break;
      }
      state.send_replace(if reconnecting {
        HubState::Reconnecting
      } else {
        HubState::Connecting
      });

      let delay = match self.connect().await {
        Ok(resp) => {
          state.send_replace(HubState::Connected);
          tracing::info!("Hub connected");
          self.policy.reset();
          match self.read_stream(resp, &mut shutdown).await {
            StreamEnd::Shutdown => break,
            StreamEnd::Dropped => {}
          }
          reconnecting = true;
          state.send_replace(HubState::Reconnecting);
          self.next_reconnect_delay(&mut reconnecting)
        }
        Err(HubError::NotSignedIn) => {
          tracing::debug!("Hub stopped: no credentials");
          break;
        }
        Err(e) if reconnecting => {
          tracing::debug!("Hub reconnect failed: {}", e);
          self.next_reconnect_delay(&mut reconnecting)
        }
        Err(e) => {
          tracing::warn!("Hub connect failed, retrying in {:?}: {}", self.policy.restart_delay(), e);
          self.policy.restart_delay()
        }
      };

      if !reconnecting {
        state.send_replace(HubState::Disconnected);
      }
      tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = shutdown.changed() => break,
      }
    }
    state.send_replace(HubState::Disconnected);
  }

  /// Follow the schedule; once exhausted, fall back to the restart delay
  fn next_reconnect_delay(&mut self, reconnecting: &mut bool) -> Duration {
    match self.policy.next_delay() {
      Some(delay) => delay,
      None => {
        *reconnecting = false;
        tracing::info!("Hub reconnect attempts exhausted, restarting in {:?}", self.policy.restart_delay());
        self.policy.restart_delay()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_notification_invocation() {
    let raw = r#"{"type":1,"target":"ReceiveNotification","arguments":[{"notificationId":5,"title":"New exam","content":"Part 5 is live","createdAt":"2024-06-01T10:00:00Z"}]}"#;
    match parse_hub_message(raw).unwrap() {
      HubMessage::Notification(n) => {
        assert_eq!(n.notification_id, 5);
        assert_eq!(n.title, "New exam");
      }
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn test_parse_control_messages() {
    assert_eq!(parse_hub_message(r#"{"type":6}"#).unwrap(), HubMessage::Ping);
    assert_eq!(
      parse_hub_message(r#"{"type":7,"error":"server shutting down"}"#).unwrap(),
      HubMessage::Close {
        error: Some("server shutting down".into())
      }
    );
    assert_eq!(
      parse_hub_message(r#"{"type":1,"target":"Other","arguments":[1]}"#).unwrap(),
      HubMessage::Other
    );
    assert!(parse_hub_message("not json").is_err());
  }

  #[test]
  fn test_payload_split_on_record_separator() {
    let payload = "{\"type\":6}\u{1e}{\"type\":6}\u{1e}";
    let messages = parse_hub_payload(payload);
    assert_eq!(messages.len(), 2);
  }

  #[test]
  fn test_sse_decoder_handles_split_chunks() {
    let mut d = SseDecoder::new();
    assert!(d.push(b"event: message\r\ndata: {\"ty").is_empty());
    let events = d.push(b"pe\":6}\r\n\r\n: comment\n\ndata: a\ndata: b\n\n");
    assert_eq!(events, vec!["{\"type\":6}".to_string(), "a\nb".to_string()]);
  }

  #[test]
  fn test_reconnect_schedule_then_restart() {
    let mut policy = ReconnectPolicy::from_config(&NotificationConfig::default());
    let delays: Vec<_> = std::iter::from_fn(|| policy.next_delay()).collect();
    assert_eq!(
      delays,
      vec![0, 1000, 2000, 5000, 10000]
        .into_iter()
        .map(Duration::from_millis)
        .collect::<Vec<_>>()
    );
    assert_eq!(policy.restart_delay(), Duration::from_secs(5));
    // schedule rewinds after being exhausted
    assert_eq!(policy.next_delay(), Some(Duration::ZERO));
  }
}
