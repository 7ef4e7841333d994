//! Review quizzes over words the scheduler reports as due.

use std::collections::BTreeSet;

use super::generator::{QuestionKind, QuizConfig, QuizMode, TimeMode};
use super::results::{QuizOutcome, review_quality};
use crate::domain::{RepetitionRecord, ReviewVocabularyRequest, VocabularyWord};

/// Word-level due records, optionally restricted to `requested` word ids
pub fn due_word_records<'a>(
  due: &'a [RepetitionRecord],
  requested: &[i64],
) -> Vec<&'a RepetitionRecord> {
  due
    .iter()
    .filter(|r| match r.vocabulary_id {
      Some(id) => requested.is_empty() || requested.contains(&id),
      None => false,
    })
    .collect()
}

/// Distinct lists the due words belong to, in ascending order
pub fn lists_to_fetch(records: &[&RepetitionRecord]) -> Vec<i64> {
  records
    .iter()
    .map(|r| r.vocabulary_list_id)
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect()
}

/// Keep only the fetched words that are due
pub fn select_due_words(words: Vec<VocabularyWord>, records: &[&RepetitionRecord]) -> Vec<VocabularyWord> {
  words
    .into_iter()
    .filter(|w| records.iter().any(|r| r.vocabulary_id == Some(w.id)))
    .collect()
}

pub fn review_config(word_count: usize, seconds_per_question: u32) -> QuizConfig {
  QuizConfig {
    folder_id: 0,
    folder_name: "Review".to_string(),
    mode: QuizMode::Review,
    question_count: word_count,
    time_mode: TimeMode::PerQuestion {
      seconds: seconds_per_question,
    },
    question_kind: QuestionKind::Mixed,
    shuffle_questions: true,
    shuffle_answers: true,
    show_examples: true,
  }
}

/// Scheduler updates for the words that were shown. Words skipped by
/// finishing early (no selection, no time spent) are left alone.
pub fn review_updates(outcome: &QuizOutcome) -> Vec<ReviewVocabularyRequest> {
  outcome
    .answers
    .iter()
    .filter(|a| !(a.selected_answer.is_empty() && a.time_spent == 0))
    .map(|a| ReviewVocabularyRequest::for_word(a.word_id, a.list_id, review_quality(a)))
    .collect()
}

/// Parse `?words=1,2,3`
pub fn parse_word_ids(raw: Option<&str>) -> Vec<i64> {
  raw
    .unwrap_or_default()
    .split(',')
    .filter_map(|s| s.trim().parse().ok())
    .collect()
}
