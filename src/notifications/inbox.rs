use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::domain::Notification;

/// Unread notification count. Single writer per client session; readers
/// subscribe. `set` is last-write-wins, so a REST refresh overrides any
/// pushes counted before it.
#[derive(Clone)]
pub struct UnreadCounter {
  tx: watch::Sender<u32>,
}

impl UnreadCounter {
  pub fn new() -> Self {
    let (tx, _) = watch::channel(0);
    Self { tx }
  }

  pub fn get(&self) -> u32 {
    *self.tx.borrow()
  }

  pub fn set(&self, count: u32) {
    self.tx.send_replace(count);
  }

  pub fn increment(&self) {
    self.tx.send_modify(|n| *n = n.saturating_add(1));
  }

  /// One notification read; never drops below zero
  pub fn decrement(&self) {
    self.tx.send_modify(|n| *n = n.saturating_sub(1));
  }

  pub fn reset(&self) {
    self.set(0);
  }

  pub fn subscribe(&self) -> watch::Receiver<u32> {
    self.tx.subscribe()
  }
}

impl Default for UnreadCounter {
  fn default() -> Self {
    Self::new()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxTab {
  All,
  Unread,
}

impl InboxTab {
  pub fn from_str(s: &str) -> Self {
    if s == "unread" { Self::Unread } else { Self::All }
  }
}

/// Notification list as shown on the notifications page
#[derive(Debug, Clone, Default)]
pub struct Inbox {
  items: Vec<Notification>,
}

impl Inbox {
  pub fn new(mut items: Vec<Notification>) -> Self {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Self { items }
  }

  pub fn items(&self, tab: InboxTab) -> Vec<&Notification> {
    self
      .items
      .iter()
      .filter(|n| tab == InboxTab::All || !n.is_read)
      .collect()
  }

  pub fn unread(&self) -> usize {
    self.items.iter().filter(|n| !n.is_read).count()
  }

  /// Returns true when the notification was unread before
  pub fn mark_read(&mut self, notification_id: i64) -> bool {
    match self.items.iter_mut().find(|n| n.notification_id == notification_id) {
      Some(n) if !n.is_read => {
        n.is_read = true;
        true
      }
      _ => false,
    }
  }

  pub fn mark_all_read(&mut self) {
    for n in &mut self.items {
      n.is_read = true;
    }
  }

  /// Newest first; duplicates from a push racing a refresh are ignored
  pub fn push_front(&mut self, notification: Notification) {
    if self
      .items
      .iter()
      .any(|n| n.notification_id == notification.notification_id)
    {
      return;
    }
    self.items.insert(0, notification);
  }
}

pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let minutes = (now - at).num_minutes();
  if minutes < 1 {
    "just now".to_string()
  } else if minutes < 60 {
    format!("{} minute{} ago", minutes, if minutes == 1 { "" } else { "s" })
  } else if minutes < 60 * 24 {
    let hours = minutes / 60;
    format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
  } else {
    let days = minutes / (60 * 24);
    format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
  }
}
