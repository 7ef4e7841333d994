//! Speaking-exam countdown endpoints, polled by the exam page.

use askama::Template;
use axum::{
  Form, Json,
  extract::{Path, State},
  http::StatusCode,
  response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::NavInfo;
use crate::auth::SignedIn;
use crate::db::LogOnError;
use crate::filters;
use crate::quota::{self, QuotaDecision};
use crate::state::AppState;
use crate::timer::{TimerPhase, TimerSnapshot};

const SPEAKING_SKILL: &str = "speaking";

/// Default phase lengths in seconds, as offered on the exam page
const INFORMATION_SECS: u32 = 45;
const PREPARATION_SECS: u32 = 30;
const RECORDING_SECS: u32 = 60;

#[derive(Template)]
#[template(path = "speaking.html")]
pub struct SpeakingTemplate {
  pub nav: NavInfo,
  pub timer: TimerSnapshot,
  pub phase: &'static str,
  pub information_secs: u32,
  pub preparation_secs: u32,
  pub recording_secs: u32,
  pub pause_on_hidden: bool,
}

/// GET /speaking - the exam page with its three countdowns
pub async fn speaking_page(State(state): State<AppState>, ctx: SignedIn) -> Html<String> {
  let timer = ctx.session.timer.poll();
  let template = SpeakingTemplate {
    nav: NavInfo::new(&ctx),
    phase: timer.phase.as_str(),
    timer,
    information_secs: INFORMATION_SECS,
    preparation_secs: PREPARATION_SECS,
    recording_secs: RECORDING_SECS,
    pause_on_hidden: state.config.timer.pause_on_hidden,
  };
  Html(template.render().unwrap_or_default())
}

#[derive(Debug, Deserialize)]
pub struct StartForm {
  pub seconds: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaBody {
  pub allowed: bool,
  pub requires_upgrade: bool,
  pub remaining: i64,
  pub message: &'static str,
}

impl From<QuotaDecision> for QuotaBody {
  fn from(decision: QuotaDecision) -> Self {
    match decision {
      QuotaDecision::Allowed { remaining } => Self {
        allowed: true,
        requires_upgrade: false,
        remaining,
        message: "",
      },
      QuotaDecision::Exhausted { remaining } => Self {
        allowed: false,
        requires_upgrade: false,
        remaining,
        message: "You have used all free attempts for this skill.",
      },
      QuotaDecision::UpgradeRequired => Self {
        allowed: false,
        requires_upgrade: true,
        remaining: 0,
        message: "Upgrade to Premium to take this exam.",
      },
    }
  }
}

/// POST /speaking/{phase}/start
///
/// Starting the information phase begins a new attempt and goes through the
/// quota gate first. Later phases are refused outside an attempt.
pub async fn speaking_start(
  State(state): State<AppState>,
  ctx: SignedIn,
  Path(phase): Path<String>,
  Form(form): Form<StartForm>,
) -> Response {
  let Some(phase) = TimerPhase::from_str(&phase) else {
    return (StatusCode::NOT_FOUND, "Unknown phase").into_response();
  };

  if phase == TimerPhase::Information {
    let decision = quota::check_skill(&ctx.session.api, SPEAKING_SKILL).await;
    if !decision.is_allowed() {
      return (StatusCode::PAYMENT_REQUIRED, Json(QuotaBody::from(decision))).into_response();
    }
    ctx
      .session
      .api
      .increment_quota(SPEAKING_SKILL)
      .await
      .log_warn("Failed to record speaking attempt");
  }

  ctx.session.ensure_timer_driver(state.timer_tick());
  if !ctx.session.timer.start_phase(phase, form.seconds) {
    let body = serde_json::json!({ "message": "Start the exam before this phase." });
    return (StatusCode::CONFLICT, Json(body)).into_response();
  }
  Json(ctx.session.timer.snapshot()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct VisibilityForm {
  /// "hidden" or "visible", as in `document.visibilityState`
  pub state: String,
}

/// POST /speaking/visibility
pub async fn speaking_visibility(ctx: SignedIn, Form(form): Form<VisibilityForm>) -> Json<TimerSnapshot> {
  ctx.session.timer.set_visibility(form.state == "hidden");
  Json(ctx.session.timer.poll())
}

/// GET /speaking/status
pub async fn speaking_status(ctx: SignedIn) -> Json<TimerSnapshot> {
  Json(ctx.session.timer.poll())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_quota_body_from_decision() {
    let body = QuotaBody::from(QuotaDecision::Exhausted { remaining: 0 });
    assert!(!body.allowed);
    assert!(!body.requires_upgrade);
    let body = QuotaBody::from(QuotaDecision::UpgradeRequired);
    assert!(body.requires_upgrade);
    assert!(QuotaBody::from(QuotaDecision::Allowed { remaining: 2 }).allowed);
  }
}
