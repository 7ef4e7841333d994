//! Spaced-repetition dashboard and word progress table.

use askama::Template;
use axum::{extract::Query, response::Html};
use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::Deserialize;

use super::NavInfo;
use crate::auth::SignedIn;
use crate::domain::{RepetitionRecord, paginate};
use crate::filters;
use crate::srs::{Dashboard, DashboardStats, StatusFilter, days_until, filter_records, quality_label, word_progress};

const WORDS_PER_PAGE: u32 = 20;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
  /// Browser offset from UTC in minutes (east positive)
  #[serde(default)]
  pub tz: Option<i32>,
}

/// "Now" on the user's calendar: the browser's offset if sent, else the server's
fn local_now(tz_minutes: Option<i32>) -> DateTime<FixedOffset> {
  let now = Utc::now();
  match tz_minutes.and_then(|m| m.checked_mul(60)).and_then(FixedOffset::east_opt) {
    Some(offset) => now.with_timezone(&offset),
    None => now.with_timezone(&Local).fixed_offset(),
  }
}

pub struct RecordRow {
  pub word: String,
  pub list_name: String,
  pub status: &'static str,
  pub review_count: u32,
  pub next_review: String,
}

impl RecordRow {
  fn new(record: &RepetitionRecord, now: DateTime<Utc>) -> Self {
    Self {
      word: record
        .vocabulary_word
        .clone()
        .unwrap_or_else(|| record.vocabulary_list_name.clone()),
      list_name: record.vocabulary_list_name.clone(),
      status: record.status.as_str(),
      review_count: record.review_count,
      next_review: next_review_label(record.next_review_at, now),
    }
  }
}

fn next_review_label(next: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
  days_label(next.map(|at| days_until(at, now)))
}

fn days_label(days: Option<i64>) -> String {
  match days {
    None => "not scheduled".to_string(),
    Some(d) if d <= 0 => "due now".to_string(),
    Some(1) => "tomorrow".to_string(),
    Some(d) => format!("in {} days", d),
  }
}

#[derive(Template)]
#[template(path = "srs/dashboard.html")]
pub struct SrsDashboardTemplate {
  pub nav: NavInfo,
  pub stats: DashboardStats,
  pub due_today: Vec<RecordRow>,
  pub mastered_today: Vec<RecordRow>,
  pub upcoming_tomorrow: Vec<RecordRow>,
  pub upcoming_week: Vec<RecordRow>,
  pub upcoming_week_total: usize,
  pub review_link: Option<String>,
  pub error: Option<String>,
}

/// GET /srs
pub async fn srs_dashboard(ctx: SignedIn, Query(query): Query<DashboardQuery>) -> Html<String> {
  let api = &ctx.session.api;
  let (all, due) = tokio::join!(api.all_repetitions(), api.due_for_review());
  let mut error = None;
  let all = all.unwrap_or_else(|e| {
    tracing::warn!("Failed to load repetition records: {}", e);
    error = Some(e.user_message());
    Vec::new()
  });
  let due = due.unwrap_or_else(|e| {
    tracing::warn!("Failed to load due reviews: {}", e);
    error.get_or_insert(e.user_message());
    Vec::new()
  });

  let now = local_now(query.tz);
  let dashboard = Dashboard::build(&all, &due, now);
  let utc_now = now.with_timezone(&Utc);
  let rows = |records: &[RepetitionRecord]| -> Vec<RecordRow> {
    records.iter().map(|r| RecordRow::new(r, utc_now)).collect()
  };

  let word_ids = dashboard.due_word_ids();
  let review_link = (!word_ids.is_empty()).then(|| {
    let ids: Vec<String> = word_ids.iter().map(|id| id.to_string()).collect();
    format!("/review?words={}", ids.join(","))
  });

  let template = SrsDashboardTemplate {
    nav: NavInfo::new(&ctx),
    stats: dashboard.stats,
    due_today: rows(&dashboard.due_today),
    mastered_today: rows(&dashboard.mastered_today),
    upcoming_tomorrow: rows(&dashboard.upcoming_tomorrow),
    upcoming_week: rows(dashboard.upcoming_week_preview()),
    upcoming_week_total: dashboard.upcoming_week.len(),
    review_link,
    error,
  };
  Html(template.render().unwrap_or_default())
}

#[derive(Clone)]
pub struct WordRow {
  pub word: String,
  pub list_name: String,
  pub status: &'static str,
  pub review_count: u32,
  pub intervals: u32,
  pub next_review: String,
  pub quality: &'static str,
}

#[derive(Template)]
#[template(path = "srs/words.html")]
pub struct SrsWordsTemplate {
  pub nav: NavInfo,
  pub filter: &'static str,
  pub rows: Vec<WordRow>,
  pub page: u32,
  pub total_pages: u32,
  pub total: u32,
  pub has_next: bool,
  pub has_previous: bool,
  pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WordsQuery {
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub page: Option<u32>,
}

/// GET /srs/words
pub async fn srs_words(ctx: SignedIn, Query(query): Query<WordsQuery>) -> Html<String> {
  let (records, error) = match ctx.session.api.all_repetitions().await {
    Ok(records) => (records, None),
    Err(e) => (Vec::new(), Some(e.user_message())),
  };
  let filter = StatusFilter::from_str(query.status.as_deref().unwrap_or("all"));
  let matching: Vec<RepetitionRecord> = filter_records(&records, filter).into_iter().cloned().collect();

  let now = Utc::now();
  let rows: Vec<WordRow> = word_progress(&matching, now)
    .into_iter()
    .map(|row| WordRow {
      word: row.word,
      list_name: row.list_name,
      status: row.status.as_str(),
      review_count: row.review_count,
      intervals: row.intervals,
      next_review: days_label(row.days_until),
      quality: quality_label(row.quality),
    })
    .collect();
  let paged = paginate(&rows, query.page.unwrap_or(1), WORDS_PER_PAGE);

  let template = SrsWordsTemplate {
    nav: NavInfo::new(&ctx),
    filter: filter.as_str(),
    rows: paged.items,
    page: paged.page,
    total_pages: paged.total_pages,
    total: paged.total,
    has_next: paged.has_next,
    has_previous: paged.has_previous,
    error,
  };
  Html(template.render().unwrap_or_default())
}
