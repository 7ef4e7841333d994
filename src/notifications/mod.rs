//! Notification inbox, unread counter and the real-time hub.

pub mod hub;
pub mod inbox;

pub use hub::{HubClient, HubHandle, HubMessage, HubState, ReconnectPolicy, SseDecoder};
pub use inbox::{Inbox, InboxTab, UnreadCounter, relative_time};

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::LuminaApi;
use crate::config::NotificationConfig;
use crate::domain::RealtimeNotification;
use crate::session::lock;

/// Per-session notification plumbing. Started on login, stopped on logout.
pub struct NotificationCenter {
  unread: UnreadCounter,
  feed: broadcast::Sender<RealtimeNotification>,
  running: Mutex<Option<Running>>,
}

struct Running {
  hub: HubHandle,
  poller: JoinHandle<()>,
  inbox_feed: JoinHandle<()>,
}

impl Running {
  fn shutdown(self) {
    self.hub.stop();
    self.poller.abort();
    self.inbox_feed.abort();
  }
}

impl NotificationCenter {
  pub fn new() -> Self {
    let (feed, _) = broadcast::channel(64);
    Self {
      unread: UnreadCounter::new(),
      feed,
      running: Mutex::new(None),
    }
  }

  pub fn unread(&self) -> &UnreadCounter {
    &self.unread
  }

  pub fn subscribe(&self) -> broadcast::Receiver<RealtimeNotification> {
    self.feed.subscribe()
  }

  pub fn hub_state(&self) -> HubState {
    match self.running.lock() {
      Ok(guard) => guard.as_ref().map(|r| r.hub.state()).unwrap_or(HubState::Disconnected),
      Err(_) => HubState::Disconnected,
    }
  }

  pub fn is_running(&self) -> bool {
    self.running.lock().map(|g| g.is_some()).unwrap_or(false)
  }

  /// Connect the hub, the fallback poller and the inbox feed. No-op when
  /// already running.
  pub fn start(
    &self,
    api: &LuminaApi,
    stream_http: reqwest::Client,
    hub_url: &str,
    config: &NotificationConfig,
    inbox: Arc<Mutex<Inbox>>,
  ) {
    let Ok(mut running) = self.running.lock() else { return };
    if running.as_ref().is_some_and(|r| !r.hub.is_finished()) {
      return;
    }
    if let Some(finished) = running.take() {
      finished.shutdown();
    }

    let inbox_feed = spawn_inbox_feed(self.subscribe(), inbox);
    let hub = HubClient::new(
      stream_http,
      hub_url,
      api.auth().clone(),
      self.unread.clone(),
      self.feed.clone(),
      ReconnectPolicy::from_config(config),
    )
    .spawn();
    let poller = spawn_unread_poller(
      api.clone(),
      self.unread.clone(),
      hub.subscribe_state(),
      Duration::from_secs(config.poll_interval_secs.max(1)),
    );
    *running = Some(Running { hub, poller, inbox_feed });
  }

  pub fn stop(&self) {
    let Ok(mut running) = self.running.lock() else { return };
    if let Some(r) = running.take() {
      r.shutdown();
      tracing::debug!("Notification hub stopped");
    }
    self.unread.reset();
  }
}

impl Default for NotificationCenter {
  fn default() -> Self {
    Self::new()
  }
}

impl Drop for NotificationCenter {
  fn drop(&mut self) {
    self.stop();
  }
}

/// Refresh the unread count from REST once at start, then every `every`
/// while the hub is not connected.
pub fn spawn_unread_poller(
  api: LuminaApi,
  unread: UnreadCounter,
  hub_state: watch::Receiver<HubState>,
  every: Duration,
) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut first = true;
    loop {
      interval.tick().await;
      if !first && *hub_state.borrow() == HubState::Connected {
        continue;
      }
      first = false;
      match api.unread_count().await {
        Ok(count) => unread.set(count),
        Err(e) if e.is_auth() => {
          tracing::debug!("Unread poller stopped: {}", e);
          break;
        }
        Err(e) => tracing::warn!("Failed to refresh unread count: {}", e),
      }
    }
  })
}

/// Put every pushed notification at the top of the session inbox
pub fn spawn_inbox_feed(
  mut feed: broadcast::Receiver<RealtimeNotification>,
  inbox: Arc<Mutex<Inbox>>,
) -> JoinHandle<()> {
  tokio::spawn(async move {
    loop {
      match feed.recv().await {
        Ok(notification) => lock(&inbox).push_front(notification.into()),
        Err(RecvError::Lagged(skipped)) => {
          tracing::warn!("Inbox feed fell behind, {} notification(s) skipped", skipped);
        }
        Err(RecvError::Closed) => break,
      }
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::auth::AuthSession;
  use chrono::Utc;

  fn pushed(id: i64, title: &str) -> RealtimeNotification {
    RealtimeNotification {
      notification_id: id,
      title: title.to_string(),
      content: String::new(),
      created_at: Utc::now(),
    }
  }

  #[tokio::test]
  async fn test_inbox_feed_prepends_pushes() {
    let center = NotificationCenter::new();
    let inbox = Arc::new(Mutex::new(Inbox::default()));
    let task = spawn_inbox_feed(center.subscribe(), inbox.clone());

    center.feed.send(pushed(1, "Streak kept")).unwrap();
    center.feed.send(pushed(2, "New list shared")).unwrap();
    center.feed.send(pushed(2, "New list shared")).unwrap();
    drop(center);
    task.await.unwrap();

    let inbox = inbox.lock().unwrap();
    assert_eq!(inbox.unread(), 2);
    let ids: Vec<i64> = inbox.items(InboxTab::All).iter().map(|n| n.notification_id).collect();
    assert_eq!(ids, vec![2, 1]);
  }

  #[tokio::test]
  async fn test_restart_after_finished_hub_aborts_old_tasks() {
    let center = NotificationCenter::new();
    let auth = Arc::new(AuthSession::detached());
    let api = LuminaApi::new(reqwest::Client::new(), "http://127.0.0.1:9", auth.clone());
    let inbox = Arc::new(Mutex::new(Inbox::default()));

    // Signed out, so this hub gives up straight away
    let hub = HubClient::new(
      reqwest::Client::new(),
      "http://127.0.0.1:9/notificationHub",
      auth,
      center.unread.clone(),
      center.feed.clone(),
      ReconnectPolicy::new(Vec::new(), Duration::from_secs(5)),
    )
    .spawn();
    while !hub.is_finished() {
      tokio::task::yield_now().await;
    }
    let poller = tokio::spawn(std::future::pending::<()>());
    let inbox_feed = tokio::spawn(std::future::pending::<()>());
    let (old_poller, old_feed) = (poller.abort_handle(), inbox_feed.abort_handle());
    *center.running.lock().unwrap() = Some(Running { hub, poller, inbox_feed });

    center.start(
      &api,
      reqwest::Client::new(),
      "http://127.0.0.1:9/notificationHub",
      &NotificationConfig::default(),
      inbox,
    );
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(old_poller.is_finished());
    assert!(old_feed.is_finished());
    assert!(center.is_running());
  }
}
