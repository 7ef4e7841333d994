//! Read-side aggregation of backend repetition records.
//!
//! Buckets are computed on the user's local calendar: a record is "today"
//! when its next review falls on today's local date, regardless of the hour.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use std::collections::HashSet;

use crate::config::{UPCOMING_DISPLAY_LIMIT, UPCOMING_WINDOW_DAYS};
use crate::domain::{RepetitionRecord, RepetitionStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
  pub due_today: usize,
  pub learning: usize,
  pub mastered: usize,
  pub total_reviewed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Dashboard {
  pub due_today: Vec<RepetitionRecord>,
  pub mastered_today: Vec<RepetitionRecord>,
  pub upcoming_tomorrow: Vec<RepetitionRecord>,
  pub upcoming_week: Vec<RepetitionRecord>,
  pub stats: DashboardStats,
}

fn local_date(dt: DateTime<Utc>, offset: &FixedOffset) -> NaiveDate {
  dt.with_timezone(offset).date_naive()
}

impl Dashboard {
  /// `all` is every record of the user, `due` the backend's due list
  pub fn build(all: &[RepetitionRecord], due: &[RepetitionRecord], now: DateTime<FixedOffset>) -> Self {
    let offset = *now.offset();
    let today = now.date_naive();
    let tomorrow = today + Duration::days(1);
    let week_end = today + Duration::days(UPCOMING_WINDOW_DAYS);

    let mut seen = HashSet::new();
    let mut due_today = Vec::new();
    let candidates = all.iter().filter(|r| {
      r.next_review_at
        .is_some_and(|at| local_date(at, &offset) <= today)
    });
    for record in candidates.chain(due.iter()) {
      if seen.insert(record.user_spaced_repetition_id) {
        due_today.push(record.clone());
      }
    }

    let mastered_today = all
      .iter()
      .filter(|r| r.status == RepetitionStatus::Mastered)
      .filter(|r| {
        r.last_reviewed_at
          .is_some_and(|at| local_date(at, &offset) == today)
      })
      .cloned()
      .collect();

    let upcoming = |from: NaiveDate, to: NaiveDate| {
      let mut records: Vec<RepetitionRecord> = all
        .iter()
        .filter(|r| !seen.contains(&r.user_spaced_repetition_id))
        .filter(|r| {
          r.next_review_at.is_some_and(|at| {
            let date = local_date(at, &offset);
            date >= from && date <= to
          })
        })
        .cloned()
        .collect();
      records.sort_by_key(|r| r.next_review_at);
      records
    };
    let upcoming_tomorrow = upcoming(tomorrow, tomorrow);
    let upcoming_week = upcoming(tomorrow + Duration::days(1), week_end);

    let stats = DashboardStats {
      due_today: due_today.len(),
      learning: all
        .iter()
        .filter(|r| r.status == RepetitionStatus::Learning && r.review_count > 0)
        .count(),
      mastered: all
        .iter()
        .filter(|r| r.status == RepetitionStatus::Mastered)
        .count(),
      total_reviewed: all.iter().filter(|r| r.review_count > 0).count(),
    };

    Self {
      due_today,
      mastered_today,
      upcoming_tomorrow,
      upcoming_week,
      stats,
    }
  }

  /// The week bucket as displayed
  pub fn upcoming_week_preview(&self) -> &[RepetitionRecord] {
    let n = self.upcoming_week.len().min(UPCOMING_DISPLAY_LIMIT);
    &self.upcoming_week[..n]
  }

  /// Word ids due today, for starting a review quiz
  pub fn due_word_ids(&self) -> Vec<i64> {
    self.due_today.iter().filter_map(|r| r.vocabulary_id).collect()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
  All,
  Due,
  Learning,
  Mastered,
}

impl StatusFilter {
  pub fn from_str(s: &str) -> Self {
    match s {
      "due" => Self::Due,
      "learning" => Self::Learning,
      "mastered" => Self::Mastered,
      _ => Self::All,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::All => "all",
      Self::Due => "due",
      Self::Learning => "learning",
      Self::Mastered => "mastered",
    }
  }
}

pub fn filter_records(records: &[RepetitionRecord], filter: StatusFilter) -> Vec<&RepetitionRecord> {
  records
    .iter()
    .filter(|r| match filter {
      StatusFilter::All => true,
      StatusFilter::Due => r.is_due,
      StatusFilter::Learning => r.status == RepetitionStatus::Learning,
      StatusFilter::Mastered => r.status == RepetitionStatus::Mastered,
    })
    .collect()
}

/// Whole days until `next`, rounded up; zero or negative when overdue
pub fn days_until(next: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
  let secs = (next - now).num_seconds();
  let day = 86_400;
  if secs > 0 { (secs + day - 1) / day } else { secs / day }
}
