//! Vocabulary quiz pages: folder picker, play loop and results.

use askama::Template;
use axum::{
  Form,
  extract::{Query, State},
  response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::time::Instant;

use super::{NavInfo, NoticeQuery, with_notice};
use crate::auth::SignedIn;
use crate::config::AppConfig;
use crate::deck;
use crate::domain::{VocabularyList, paginate};
use crate::filters;
use crate::quiz::{
  QuestionType, QuizConfig, QuizConfigForm, QuizError, QuizMode, QuizOutcome, QuizPhase, QuizRun,
  QuizSession, ResultFilter, TimeMode,
};
use crate::session::lock;
use crate::state::AppState;
use crate::sync::{self, Delivery};

/// Quiz defaults from the loaded configuration
pub fn quiz_defaults(config: &AppConfig) -> QuizConfig {
  QuizConfig {
    question_count: config.quiz.question_count,
    time_mode: TimeMode::PerQuestion {
      seconds: config.quiz.time_per_question_secs,
    },
    ..QuizConfig::default()
  }
}

// ==================== Picker ====================

pub struct ListCard {
  pub id: i64,
  pub name: String,
  pub owner: String,
  pub word_count: u32,
  pub best_score: Option<u32>,
  pub last_score: Option<u32>,
  pub attempts: u32,
}

impl From<&VocabularyList> for ListCard {
  fn from(list: &VocabularyList) -> Self {
    Self {
      id: list.vocabulary_list_id,
      name: list.name.clone(),
      owner: list.make_by_name.clone(),
      word_count: list.vocabulary_count,
      best_score: list.best_score,
      last_score: list.last_score,
      attempts: list.total_attempts.unwrap_or(0),
    }
  }
}

#[derive(Template)]
#[template(path = "quiz/picker.html")]
pub struct QuizPickerTemplate {
  pub nav: NavInfo,
  pub lists: Vec<ListCard>,
  pub page: u32,
  pub total_pages: u32,
  pub has_next: bool,
  pub has_previous: bool,
  pub question_count: usize,
  pub time_per_question: u32,
  pub error: Option<String>,
  pub notice: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PickerQuery {
  #[serde(default)]
  pub page: Option<u32>,
  #[serde(default)]
  pub notice: Option<String>,
}

/// GET /quiz - choose a folder and quiz settings
pub async fn quiz_picker(
  State(state): State<AppState>,
  ctx: SignedIn,
  Query(query): Query<PickerQuery>,
) -> Html<String> {
  let (lists, error) = match ctx.session.api.lists_with_scores().await {
    Ok(lists) => (lists, None),
    Err(e) => {
      tracing::warn!("Failed to load vocabulary lists: {}", e);
      (Vec::new(), Some(e.user_message()))
    }
  };
  let playable: Vec<VocabularyList> = lists.into_iter().filter(|l| l.is_playable()).collect();
  let paged = paginate(&playable, query.page.unwrap_or(1), state.config.quiz.lists_per_page);

  let template = QuizPickerTemplate {
    nav: NavInfo::new(&ctx),
    lists: paged.items.iter().map(ListCard::from).collect(),
    page: paged.page,
    total_pages: paged.total_pages,
    has_next: paged.has_next,
    has_previous: paged.has_previous,
    question_count: state.config.quiz.question_count,
    time_per_question: state.config.quiz.time_per_question_secs,
    error,
    notice: query.notice,
  };
  Html(template.render().unwrap_or_default())
}

/// POST /quiz/start - load the deck and begin
pub async fn quiz_start(
  State(state): State<AppState>,
  ctx: SignedIn,
  Form(form): Form<QuizConfigForm>,
) -> Redirect {
  let config = form.into_config(&quiz_defaults(&state.config));
  let words = match deck::load_deck(&ctx.session.api, config.folder_id).await {
    Ok((_, words)) => words,
    Err(e) => return Redirect::to(&with_notice("/quiz", &e.user_message())),
  };

  let mut session = QuizSession::new(config);
  if let Err(e) = session.load(&words, &mut rand::rng()) {
    return Redirect::to(&with_notice("/quiz", &e.to_string()));
  }
  *lock(&ctx.session.quiz) = Some(QuizRun::new(session));
  Redirect::to("/quiz/play")
}

// ==================== Play ====================

pub struct OptionView {
  pub text: String,
  /// "", "selected", "correct" or "wrong"
  pub state: &'static str,
}

/// One question as rendered, shared with the review page
pub struct QuestionView {
  pub number: usize,
  pub total: usize,
  pub answered_count: usize,
  pub mode: &'static str,
  pub folder_name: String,
  pub label: &'static str,
  pub prompt: String,
  pub audio_url: Option<String>,
  pub options: Vec<OptionView>,
  pub answered: bool,
  pub timed_out: bool,
  pub feedback: Option<String>,
  pub example: Option<String>,
  pub question_remaining: Option<u32>,
  pub total_remaining: Option<u32>,
  pub can_previous: bool,
  pub is_last: bool,
  pub submits_on_select: bool,
}

impl QuestionView {
  pub fn build(session: &QuizSession) -> Option<Self> {
    let question = session.current_question()?;
    let config = session.config();
    let answer = session.current_answer();
    let draft = session.current_draft();
    // Practice reveals each answer; the other modes keep it for the results
    let reveal = config.mode == QuizMode::Practice && (answer.is_some() || session.current_timed_out());

    let options = question
      .options
      .iter()
      .map(|option| {
        let chosen = answer.map(|a| a.selected_answer.as_str()).or(draft) == Some(option.as_str());
        let state = if reveal && *option == question.correct_answer {
          "correct"
        } else if reveal && chosen {
          "wrong"
        } else if chosen {
          "selected"
        } else {
          ""
        };
        OptionView {
          text: option.clone(),
          state,
        }
      })
      .collect();

    let feedback = if config.mode == QuizMode::Review {
      session.last_answer().map(|a| {
        if a.is_correct {
          "Previous answer: correct".to_string()
        } else {
          format!("Previous answer: incorrect, it was \"{}\"", a.correct_answer)
        }
      })
    } else if reveal {
      Some(match answer {
        Some(a) if a.is_correct => "Correct!".to_string(),
        _ if session.current_timed_out() && answer.is_none() => {
          format!("Time's up. The answer is \"{}\"", question.correct_answer)
        }
        _ => format!("Incorrect. The answer is \"{}\"", question.correct_answer),
      })
    } else {
      None
    };

    Some(Self {
      number: session.current_index() + 1,
      total: session.question_count(),
      answered_count: session.answered_count(),
      mode: config.mode.as_str(),
      folder_name: config.folder_name.clone(),
      label: match question.question_type {
        QuestionType::WordToMeaning => "Choose the meaning",
        QuestionType::MeaningToWord => "Choose the word",
        QuestionType::Listening => "Listen and choose the meaning",
      },
      prompt: question.prompt.clone(),
      audio_url: question.audio_url.clone(),
      options,
      answered: answer.is_some(),
      timed_out: session.current_timed_out(),
      feedback,
      example: question.example.clone().filter(|_| config.show_examples && reveal),
      question_remaining: session.question_remaining(),
      total_remaining: session.total_remaining(),
      can_previous: session.current_index() > 0 && config.mode != QuizMode::Review,
      is_last: session.current_index() + 1 == session.question_count(),
      submits_on_select: config.mode.submits_on_select(),
    })
  }
}

#[derive(Template)]
#[template(path = "quiz/play.html")]
pub struct QuizPlayTemplate {
  pub nav: NavInfo,
  pub q: QuestionView,
  pub notice: Option<String>,
}

/// GET /quiz/play
pub async fn quiz_play(ctx: SignedIn, Query(query): Query<NoticeQuery>) -> Response {
  let view = {
    let mut quiz = lock(&ctx.session.quiz);
    let Some(run) = quiz.as_mut() else {
      return Redirect::to("/quiz").into_response();
    };
    run.catch_up(Instant::now());
    if run.session.phase() == QuizPhase::Finished {
      return Redirect::to("/quiz/results").into_response();
    }
    QuestionView::build(&run.session)
  };
  let Some(q) = view else {
    return Redirect::to("/quiz").into_response();
  };

  let template = QuizPlayTemplate {
    nav: NavInfo::new(&ctx),
    q,
    notice: query.notice,
  };
  Html(template.render().unwrap_or_default()).into_response()
}

/// Apply a quiz action after syncing the clock, then route to the next page
fn act(ctx: &SignedIn, action: impl FnOnce(&mut QuizSession) -> Result<(), QuizError>) -> Redirect {
  let mut quiz = lock(&ctx.session.quiz);
  let Some(run) = quiz.as_mut() else {
    return Redirect::to("/quiz");
  };
  run.catch_up(Instant::now());
  if run.session.phase() == QuizPhase::InProgress {
    if let Err(e) = action(&mut run.session) {
      return Redirect::to(&with_notice("/quiz/play", &e.to_string()));
    }
  }
  if run.session.phase() == QuizPhase::Finished {
    Redirect::to("/quiz/results")
  } else {
    Redirect::to("/quiz/play")
  }
}

#[derive(Debug, Deserialize)]
pub struct AnswerForm {
  pub answer: String,
}

/// POST /quiz/select
pub async fn quiz_select(ctx: SignedIn, Form(form): Form<AnswerForm>) -> Redirect {
  act(&ctx, |s| s.select_answer(&form.answer))
}

/// POST /quiz/submit
pub async fn quiz_submit(ctx: SignedIn) -> Redirect {
  act(&ctx, |s| s.submit_answer())
}

/// POST /quiz/next
pub async fn quiz_next(ctx: SignedIn) -> Redirect {
  act(&ctx, |s| s.next())
}

/// POST /quiz/previous
pub async fn quiz_previous(ctx: SignedIn) -> Redirect {
  act(&ctx, |s| s.previous())
}

/// POST /quiz/finish
pub async fn quiz_finish(ctx: SignedIn) -> Redirect {
  act(&ctx, |s| {
    s.finish();
    Ok(())
  })
}

// ==================== Results ====================

pub struct ResultRow {
  pub number: usize,
  pub word: String,
  pub prompt: String,
  pub selected: String,
  pub correct_answer: String,
  pub is_correct: bool,
  pub time_spent: u32,
}

#[derive(Template)]
#[template(path = "quiz/results.html")]
pub struct QuizResultsTemplate {
  pub nav: NavInfo,
  pub folder_name: String,
  pub mode: &'static str,
  pub score: u32,
  pub badge: &'static str,
  pub badge_tone: &'static str,
  pub correct_count: u32,
  pub incorrect_count: u32,
  pub total_questions: u32,
  pub total_time: u32,
  pub average_time: u32,
  pub filter: &'static str,
  pub rows: Vec<ResultRow>,
  pub words_to_review: Vec<String>,
  pub save_status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultsQuery {
  #[serde(default)]
  pub filter: Option<String>,
}

/// How a backend save went, as shown under the score
pub fn delivery_message(result: &Result<Delivery, crate::api::ApiError>) -> String {
  match result {
    Ok(Delivery::Sent) => "Result saved.".to_string(),
    Ok(Delivery::Queued) => "You're offline. The result will be saved when the connection returns.".to_string(),
    Err(e) => format!("Result could not be saved: {}", e.user_message()),
  }
}

/// GET /quiz/results
pub async fn quiz_results(
  State(state): State<AppState>,
  ctx: SignedIn,
  Query(query): Query<ResultsQuery>,
) -> Response {
  let (outcome, unreported): (QuizOutcome, Option<QuizOutcome>) = {
    let mut quiz = lock(&ctx.session.quiz);
    let Some(run) = quiz.as_mut() else {
      return Redirect::to("/quiz").into_response();
    };
    run.catch_up(Instant::now());
    let Some(outcome) = run.session.outcome().cloned() else {
      return Redirect::to("/quiz/play").into_response();
    };
    (outcome, run.take_unreported())
  };

  let save_status = match unreported {
    Some(done) => {
      let result = sync::submit_quiz_result(&state.db, &ctx.session.api, &done.to_result_request()).await;
      if let Err(e) = &result {
        tracing::warn!("Failed to save quiz result: {}", e);
      }
      Some(delivery_message(&result))
    }
    None => None,
  };

  let filter = ResultFilter::from_str(query.filter.as_deref().unwrap_or("all"));
  let rows = outcome
    .filtered(filter)
    .into_iter()
    .map(|(q, a)| ResultRow {
      number: q.id + 1,
      word: q.word.clone(),
      prompt: q.prompt.clone(),
      selected: a.selected_answer.clone(),
      correct_answer: a.correct_answer.clone(),
      is_correct: a.is_correct,
      time_spent: a.time_spent,
    })
    .collect();
  let badge = outcome.badge();

  let template = QuizResultsTemplate {
    nav: NavInfo::new(&ctx),
    folder_name: outcome.folder_name.clone(),
    mode: outcome.mode.as_str(),
    score: outcome.score,
    badge: badge.label(),
    badge_tone: badge.tone(),
    correct_count: outcome.correct_count,
    incorrect_count: outcome.incorrect_count(),
    total_questions: outcome.total_questions,
    total_time: outcome.total_time_spent,
    average_time: outcome.average_time(),
    filter: filter.as_str(),
    rows,
    words_to_review: outcome.words_to_review().iter().map(|q| q.word.clone()).collect(),
    save_status,
  };
  Html(template.render().unwrap_or_default()).into_response()
}
