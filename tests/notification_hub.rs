mod common;

use axum::{
  Router,
  extract::Query,
  response::sse::{Event, Sse},
  routing::get,
};
use futures_util::stream::{self, Stream, StreamExt};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

use common::{serve, signed_in};
use lumina_client::api;
use lumina_client::notifications::{HubClient, HubState, ReconnectPolicy, UnreadCounter};

fn invocation(id: i64, title: &str) -> String {
  format!(
    "{{\"type\":1,\"target\":\"ReceiveNotification\",\"arguments\":[{{\"notificationId\":{},\"title\":\"{}\",\"content\":\"\",\"createdAt\":\"2026-03-01T08:00:00Z\"}}]}}\u{1e}",
    id, title
  )
}

type EventStream = std::pin::Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

/// Hub endpoint sending one notification per connection. With `hold` the
/// stream stays open afterwards; otherwise it ends and the client reconnects.
fn hub_backend(connections: Arc<AtomicUsize>, tokens: Arc<Mutex<Vec<String>>>, hold: bool) -> Router {
  Router::new().route(
    "/notificationHub",
    get(move |Query(params): Query<HashMap<String, String>>| {
      let connections = connections.clone();
      let tokens = tokens.clone();
      async move {
        let n = connections.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        if let Some(token) = params.get("access_token") {
          tokens.lock().unwrap().push(token.clone());
        }
        let ping: Result<Event, Infallible> = Ok(Event::default().data("{\"type\":6}\u{1e}"));
        let message: Result<Event, Infallible> = Ok(Event::default().data(invocation(n, "Part 5 results")));
        let events = stream::iter(vec![ping, message]);
        let body: EventStream = if hold {
          Box::pin(events.chain(stream::pending()))
        } else {
          Box::pin(events)
        };
        Sse::new(body)
      }
    }),
  )
}

fn policy() -> ReconnectPolicy {
  ReconnectPolicy::new(vec![Duration::from_millis(10), Duration::from_millis(20)], Duration::from_millis(50))
}

#[tokio::test]
async fn test_pushed_notification_bumps_unread() {
  let connections = Arc::new(AtomicUsize::new(0));
  let tokens = Arc::new(Mutex::new(Vec::new()));
  let origin = serve(hub_backend(connections.clone(), tokens.clone(), true)).await;

  let unread = UnreadCounter::new();
  let (feed, mut received) = broadcast::channel(8);
  let client = HubClient::new(
    api::build_stream_client(Duration::from_secs(5)),
    &format!("{}/notificationHub", origin),
    signed_in("s1", None, "hub-token"),
    unread.clone(),
    feed,
    policy(),
  );
  let handle = client.spawn();

  let notification = tokio::time::timeout(Duration::from_secs(5), received.recv())
    .await
    .expect("no notification within 5s")
    .unwrap();
  assert_eq!(notification.notification_id, 1);
  assert_eq!(notification.title, "Part 5 results");
  assert_eq!(unread.get(), 1);
  assert_eq!(handle.state(), HubState::Connected);
  assert_eq!(*tokens.lock().unwrap(), vec!["hub-token".to_string()]);

  handle.join().await;
  assert_eq!(connections.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_dropped_stream_reconnects() {
  let connections = Arc::new(AtomicUsize::new(0));
  let tokens = Arc::new(Mutex::new(Vec::new()));
  let origin = serve(hub_backend(connections.clone(), tokens, false)).await;

  let unread = UnreadCounter::new();
  let (feed, mut received) = broadcast::channel(8);
  let handle = HubClient::new(
    api::build_stream_client(Duration::from_secs(5)),
    &format!("{}/notificationHub", origin),
    signed_in("s1", None, "hub-token"),
    unread.clone(),
    feed,
    policy(),
  )
  .spawn();

  for expected in 1..=2 {
    let n = tokio::time::timeout(Duration::from_secs(5), received.recv())
      .await
      .expect("hub did not reconnect")
      .unwrap();
    assert_eq!(n.notification_id, expected);
  }
  assert!(connections.load(Ordering::SeqCst) >= 2);
  assert!(unread.get() >= 2);
  handle.join().await;
}

#[tokio::test]
async fn test_hub_without_credentials_stops() {
  let connections = Arc::new(AtomicUsize::new(0));
  let tokens = Arc::new(Mutex::new(Vec::new()));
  let origin = serve(hub_backend(connections.clone(), tokens, true)).await;

  let (feed, _) = broadcast::channel(8);
  let handle = HubClient::new(
    api::build_stream_client(Duration::from_secs(5)),
    &format!("{}/notificationHub", origin),
    Arc::new(lumina_client::auth::AuthSession::detached()),
    UnreadCounter::new(),
    feed,
    policy(),
  )
  .spawn();

  let mut state = handle.subscribe_state();
  tokio::time::timeout(Duration::from_secs(5), async {
    while !handle.is_finished() {
      let _ = tokio::time::timeout(Duration::from_millis(20), state.changed()).await;
    }
  })
  .await
  .expect("hub task kept running without credentials");
  assert_eq!(handle.state(), HubState::Disconnected);
  assert_eq!(connections.load(Ordering::SeqCst), 0);
}
