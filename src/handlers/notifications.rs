//! Notification inbox pages and the unread badge endpoint.

use askama::Template;
use axum::{
  Json,
  extract::{Path, Query},
  response::{Html, Redirect},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{NavInfo, with_notice};
use crate::auth::SignedIn;
use crate::filters;
use crate::notifications::{Inbox, InboxTab, relative_time};
use crate::session::lock;

pub struct NotificationRow {
  pub id: i64,
  pub title: String,
  pub content: String,
  pub is_read: bool,
  pub when: String,
}

#[derive(Template)]
#[template(path = "notifications.html")]
pub struct NotificationsTemplate {
  pub nav: NavInfo,
  pub tab: &'static str,
  pub rows: Vec<NotificationRow>,
  pub unread: usize,
  pub error: Option<String>,
  pub notice: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InboxQuery {
  #[serde(default)]
  pub tab: Option<String>,
  #[serde(default)]
  pub notice: Option<String>,
}

/// GET /notifications
pub async fn notifications_page(ctx: SignedIn, Query(query): Query<InboxQuery>) -> Html<String> {
  let error = match ctx.session.api.my_notifications().await {
    Ok(items) => {
      let inbox = Inbox::new(items);
      ctx.session.notifications.unread().set(inbox.unread() as u32);
      *lock(&ctx.session.inbox) = inbox;
      None
    }
    // Keep showing the last list we had
    Err(e) => {
      tracing::warn!("Failed to load notifications: {}", e);
      Some(e.user_message())
    }
  };

  let tab = InboxTab::from_str(query.tab.as_deref().unwrap_or("all"));
  let now = Utc::now();
  let (rows, unread) = {
    let inbox = lock(&ctx.session.inbox);
    let rows = inbox
      .items(tab)
      .into_iter()
      .map(|n| NotificationRow {
        id: n.notification_id,
        title: n.title.clone(),
        content: n.content.clone(),
        is_read: n.is_read,
        when: relative_time(n.created_at, now),
      })
      .collect();
    (rows, inbox.unread())
  };

  let template = NotificationsTemplate {
    nav: NavInfo::new(&ctx),
    tab: if tab == InboxTab::Unread { "unread" } else { "all" },
    rows,
    unread,
    error,
    notice: query.notice,
  };
  Html(template.render().unwrap_or_default())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountBody {
  pub unread_count: u32,
  pub hub_state: &'static str,
}

/// GET /notifications/unread-count - badge polling from the page
pub async fn unread_count(ctx: SignedIn) -> Json<UnreadCountBody> {
  Json(UnreadCountBody {
    unread_count: ctx.session.notifications.unread().get(),
    hub_state: ctx.session.notifications.hub_state().as_str(),
  })
}

/// POST /notifications/{id}/read
pub async fn mark_read(ctx: SignedIn, Path(notification_id): Path<i64>) -> Redirect {
  if let Err(e) = ctx.session.api.mark_notification_read(notification_id).await {
    tracing::warn!("Failed to mark notification {} read: {}", notification_id, e);
    return Redirect::to(&with_notice("/notifications", &e.user_message()));
  }
  let was_unread = lock(&ctx.session.inbox).mark_read(notification_id);
  if was_unread {
    ctx.session.notifications.unread().decrement();
  }
  Redirect::to("/notifications")
}

/// POST /notifications/read-all
pub async fn mark_all_read(ctx: SignedIn) -> Redirect {
  if let Err(e) = ctx.session.api.mark_all_notifications_read().await {
    tracing::warn!("Failed to mark all notifications read: {}", e);
    return Redirect::to(&with_notice("/notifications", &e.user_message()));
  }
  lock(&ctx.session.inbox).mark_all_read();
  ctx.session.notifications.unread().reset();
  Redirect::to("/notifications")
}
