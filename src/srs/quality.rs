//! Recall-quality estimate for the word progress table.

use chrono::{DateTime, Utc};

use super::dashboard::days_until;
use crate::domain::{RepetitionRecord, RepetitionStatus};

/// Quality 0..=5 from the latest quiz score, falling back to the scheduler
/// state. `None` for words never reviewed.
pub fn estimate_quality(record: &RepetitionRecord) -> Option<u8> {
  if let Some(score) = record.last_quiz_score {
    return Some(match score {
      90.. => 5,
      80..=89 => 4,
      70..=79 => 3,
      60..=69 => 2,
      50..=59 => 1,
      _ => 0,
    });
  }
  match record.status {
    RepetitionStatus::Mastered => Some(5),
    RepetitionStatus::Learning => Some(match record.intervals {
      30.. => 4,
      6..=29 => 3,
      _ => 2,
    }),
    RepetitionStatus::New if record.review_count > 0 => Some(if record.intervals > 1 { 3 } else { 2 }),
    _ => None,
  }
}

pub fn quality_label(quality: Option<u8>) -> &'static str {
  match quality {
    Some(5) => "Perfect",
    Some(4) => "Good",
    Some(3) => "Fair",
    Some(2) => "Hard",
    Some(_) => "Forgot",
    None => "Not reviewed",
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordProgressRow {
  pub word: String,
  pub list_name: String,
  pub status: RepetitionStatus,
  pub review_count: u32,
  pub intervals: u32,
  pub days_until: Option<i64>,
  pub quality: Option<u8>,
}

/// Word-level records as table rows, soonest review first
pub fn word_progress(records: &[RepetitionRecord], now: DateTime<Utc>) -> Vec<WordProgressRow> {
  let mut word_records: Vec<&RepetitionRecord> = records.iter().filter(|r| r.is_word_level()).collect();
  word_records.sort_by_key(|r| (r.next_review_at.is_none(), r.next_review_at));
  word_records
    .into_iter()
    .map(|r| WordProgressRow {
      word: r.vocabulary_word.clone().unwrap_or_default(),
      list_name: r.vocabulary_list_name.clone(),
      status: r.status,
      review_count: r.review_count,
      intervals: r.intervals,
      days_until: r.next_review_at.map(|at| days_until(at, now)),
      quality: estimate_quality(r),
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::srs::dashboard::tests::record;
  use chrono::Duration;

  #[test]
  fn test_quiz_score_wins() {
    let mut r = record(1, RepetitionStatus::Mastered, None);
    r.last_quiz_score = Some(72);
    assert_eq!(estimate_quality(&r), Some(3));
    r.last_quiz_score = Some(40);
    assert_eq!(estimate_quality(&r), Some(0));
  }

  #[test]
  fn test_status_fallback() {
    let mut r = record(1, RepetitionStatus::Learning, None);
    r.intervals = 30;
    assert_eq!(estimate_quality(&r), Some(4));
    r.intervals = 6;
    assert_eq!(estimate_quality(&r), Some(3));
    r.intervals = 3;
    assert_eq!(estimate_quality(&r), Some(2));

    let mut n = record(2, RepetitionStatus::New, None);
    n.intervals = 2;
    assert_eq!(estimate_quality(&n), Some(3));
    n.review_count = 0;
    assert_eq!(estimate_quality(&n), None);
    assert_eq!(quality_label(None), "Not reviewed");
  }

  #[test]
  fn test_word_progress_sorted_and_word_level_only() {
    let now = Utc::now();
    let mut list_level = record(9, RepetitionStatus::Learning, Some(now));
    list_level.vocabulary_id = None;
    let rows = word_progress(
      &[
        record(1, RepetitionStatus::Learning, Some(now + Duration::days(3))),
        record(2, RepetitionStatus::Learning, None),
        record(3, RepetitionStatus::Learning, Some(now + Duration::hours(2))),
        list_level,
      ],
      now,
    );
    let words: Vec<_> = rows.iter().map(|r| r.word.as_str()).collect();
    assert_eq!(words, vec!["word3", "word1", "word2"]);
    assert_eq!(rows[0].days_until, Some(1));
    assert_eq!(rows[2].days_until, None);
  }
}
