//! Spaced-repetition review: a quiz over the words the backend reports as due.

use askama::Template;
use axum::{
  Form,
  extract::{Query, State},
  response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::time::Instant;

use super::quiz::{AnswerForm, QuestionView};
use super::{NavInfo, with_notice};
use crate::api::{ApiError, LuminaApi};
use crate::auth::SignedIn;
use crate::deck;
use crate::domain::VocabularyWord;
use crate::filters;
use crate::quiz::review::{
  due_word_records, lists_to_fetch, parse_word_ids, review_config, review_updates, select_due_words,
};
use crate::quiz::{QuizOutcome, QuizPhase, QuizRun, QuizSession};
use crate::session::lock;
use crate::state::AppState;
use crate::sync::{self, Delivery};

#[derive(Debug, Default, Deserialize)]
pub struct ReviewQuery {
  /// Comma-separated word ids; starts a new review when present
  #[serde(default)]
  pub words: Option<String>,
  #[serde(default)]
  pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "review/play.html")]
pub struct ReviewPlayTemplate {
  pub nav: NavInfo,
  pub q: QuestionView,
  pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "review/done.html")]
pub struct ReviewDoneTemplate {
  pub nav: NavInfo,
  pub reviewed: usize,
  pub correct_count: u32,
  pub total_questions: u32,
  pub score: u32,
  pub sent: usize,
  pub queued: usize,
  pub failed: usize,
  pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "review/empty.html")]
pub struct ReviewEmptyTemplate {
  pub nav: NavInfo,
  pub error: Option<String>,
}

/// Fetch due words, optionally limited to `requested` ids
async fn load_due_words(api: &LuminaApi, requested: &[i64]) -> Result<Vec<VocabularyWord>, ApiError> {
  let due = api.due_for_review().await?;
  let records = due_word_records(&due, requested);
  let mut words = Vec::new();
  for list_id in lists_to_fetch(&records) {
    match deck::load_deck(api, list_id).await {
      Ok((_, list_words)) => words.extend(list_words),
      // One unavailable list should not block the rest of the review
      Err(e) if deck::falls_through(&e) => {
        tracing::warn!("Skipping list {} in review: {}", list_id, e);
      }
      Err(e) => return Err(e),
    }
  }
  Ok(select_due_words(words, &records))
}

/// GET /review - continue the current review, or start one
pub async fn review_page(
  State(state): State<AppState>,
  ctx: SignedIn,
  Query(query): Query<ReviewQuery>,
) -> Response {
  let starting = query.words.is_some();
  if !starting {
    if let Some(response) = render_current(&state, &ctx, query.notice.clone()).await {
      return response;
    }
  }

  let requested = parse_word_ids(query.words.as_deref());
  let words = match load_due_words(&ctx.session.api, &requested).await {
    Ok(words) => words,
    Err(e) => return render_empty(&ctx, Some(e.user_message())),
  };
  if words.is_empty() {
    return render_empty(&ctx, None);
  }

  let mut session = QuizSession::new(review_config(
    words.len(),
    state.config.quiz.review_time_per_question_secs,
  ));
  if let Err(e) = session.load(&words, &mut rand::rng()) {
    return render_empty(&ctx, Some(e.to_string()));
  }
  tracing::debug!("Review started with {} due words", words.len());
  *lock(&ctx.session.review) = Some(QuizRun::new(session));
  Redirect::to("/review").into_response()
}

/// Render the review in progress, or its summary once finished
async fn render_current(state: &AppState, ctx: &SignedIn, notice: Option<String>) -> Option<Response> {
  let (view, unreported): (Option<QuestionView>, Option<QuizOutcome>) = {
    let mut review = lock(&ctx.session.review);
    let run = review.as_mut()?;
    run.catch_up(Instant::now());
    match run.session.phase() {
      QuizPhase::InProgress => (QuestionView::build(&run.session), None),
      QuizPhase::Finished => (None, run.take_unreported()),
      QuizPhase::Loading => return None,
    }
  };

  if let Some(q) = view {
    let template = ReviewPlayTemplate {
      nav: NavInfo::new(ctx),
      q,
      notice,
    };
    return Some(Html(template.render().unwrap_or_default()).into_response());
  }

  // Finished and already summarised: start over
  let outcome = unreported?;
  let updates = review_updates(&outcome);
  let (mut sent, mut queued, mut failed) = (0, 0, 0);
  for update in &updates {
    match sync::submit_review(&state.db, &ctx.session.api, update).await {
      Ok(Delivery::Sent) => sent += 1,
      Ok(Delivery::Queued) => queued += 1,
      Err(e) => {
        tracing::warn!("Review update for word {:?} failed: {}", update.vocabulary_id, e);
        failed += 1;
      }
    }
  }

  let template = ReviewDoneTemplate {
    nav: NavInfo::new(ctx),
    reviewed: updates.len(),
    correct_count: outcome.correct_count,
    total_questions: outcome.total_questions,
    score: outcome.score,
    sent,
    queued,
    failed,
    notice,
  };
  Some(Html(template.render().unwrap_or_default()).into_response())
}

fn render_empty(ctx: &SignedIn, error: Option<String>) -> Response {
  let template = ReviewEmptyTemplate {
    nav: NavInfo::new(ctx),
    error,
  };
  Html(template.render().unwrap_or_default()).into_response()
}

/// POST /review/answer - answer and move on
pub async fn review_answer(ctx: SignedIn, Form(form): Form<AnswerForm>) -> Redirect {
  let mut review = lock(&ctx.session.review);
  let Some(run) = review.as_mut() else {
    return Redirect::to("/review?words=");
  };
  run.catch_up(Instant::now());
  if run.session.phase() == QuizPhase::InProgress {
    if let Err(e) = run.session.select_answer(&form.answer) {
      return Redirect::to(&with_notice("/review", &e.to_string()));
    }
  }
  Redirect::to("/review")
}
