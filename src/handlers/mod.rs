pub mod decks;
pub mod notifications;
pub mod quiz;
pub mod review;
pub mod speaking;
pub mod srs;

use askama::Template;
use axum::{extract::State, response::Html};
use serde::Deserialize;

use crate::auth::SignedIn;
use crate::db::{self, LogOnError};
use crate::domain::SubscriptionType;
use crate::filters;
use crate::state::AppState;

/// Header data shared by every signed-in page
pub struct NavInfo {
  pub display_name: String,
  pub role: &'static str,
  pub unread: u32,
}

impl NavInfo {
  pub fn new(ctx: &SignedIn) -> Self {
    Self {
      display_name: ctx.user.display_name().to_string(),
      role: ctx.user.role().as_str(),
      unread: ctx.session.notifications.unread().get(),
    }
  }
}

/// `?notice=` message carried across a redirect
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
  #[serde(default)]
  pub notice: Option<String>,
}

/// Redirect target with a notice attached
pub fn with_notice(path: &str, notice: &str) -> String {
  format!("{}?notice={}", path, urlencoding::encode(notice))
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
  pub nav: NavInfo,
  pub due_count: usize,
  pub pending_writes: i64,
  pub is_premium: bool,
  pub error: Option<String>,
}

pub async fn index(State(state): State<AppState>, ctx: SignedIn) -> Html<String> {
  let api = &ctx.session.api;
  let (due, subscription) = tokio::join!(api.due_for_review(), api.subscription_status());

  let (due_count, error) = match due {
    Ok(records) => (records.len(), None),
    Err(e) => (0, Some(e.user_message())),
  };
  let is_premium = subscription
    .log_warn("Failed to load subscription status")
    .is_some_and(|s| s.has_active_subscription && s.subscription_type == Some(SubscriptionType::Premium));
  let pending_writes = db::try_lock(&state.db)
    .ok()
    .map(|conn| {
      db::pending_count(&conn, ctx.session.id(), ctx.user.id).log_warn_default("Failed to count queued writes")
    })
    .unwrap_or(0);

  let template = IndexTemplate {
    nav: NavInfo::new(&ctx),
    due_count,
    pending_writes,
    is_premium,
    error,
  };
  Html(template.render().unwrap_or_default())
}

pub async fn health() -> &'static str {
  "ok"
}

pub use decks::{deck_action, deck_view};
pub use notifications::{mark_all_read, mark_read, notifications_page, unread_count};
pub use quiz::{
  quiz_finish, quiz_next, quiz_picker, quiz_play, quiz_previous, quiz_results, quiz_select,
  quiz_start, quiz_submit,
};
pub use review::{review_answer, review_page};
pub use speaking::{speaking_page, speaking_start, speaking_status, speaking_visibility};
pub use srs::{srs_dashboard, srs_words};
