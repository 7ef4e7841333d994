use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lenient_datetime;

/// Inbox entry from `/usernotification/my`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub notification_id: i64,
  pub title: String,
  #[serde(default)]
  pub content: String,
  #[serde(default)]
  pub is_read: bool,
  #[serde(with = "lenient_datetime")]
  pub created_at: DateTime<Utc>,
}

/// Payload pushed over the hub
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeNotification {
  pub notification_id: i64,
  pub title: String,
  #[serde(default)]
  pub content: String,
  #[serde(with = "lenient_datetime")]
  pub created_at: DateTime<Utc>,
}

impl From<RealtimeNotification> for Notification {
  fn from(n: RealtimeNotification) -> Self {
    Self {
      notification_id: n.notification_id,
      title: n.title,
      content: n.content,
      is_read: false,
      created_at: n.created_at,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
  pub unread_count: u32,
}
