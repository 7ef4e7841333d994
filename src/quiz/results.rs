//! Quiz results: scoring, filters and the payloads sent back to the backend.

use super::generator::{QuizConfig, QuizMode, QuizQuestion};
use super::session::QuizAnswer;
use crate::config::{REVIEW_FAST_ANSWER_SECS, REVIEW_STEADY_ANSWER_SECS};
use crate::domain::{QuizResultRequest, ReviewVocabularyRequest};

/// `round(correct / total * 100)`, halves rounding up
pub fn score(correct: usize, total: usize) -> u32 {
  if total == 0 {
    return 0;
  }
  ((200 * correct + total) / (2 * total)) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultFilter {
  All,
  Correct,
  Incorrect,
}

impl ResultFilter {
  pub fn from_str(s: &str) -> Self {
    match s {
      "correct" => Self::Correct,
      "incorrect" => Self::Incorrect,
      _ => Self::All,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::All => "all",
      Self::Correct => "correct",
      Self::Incorrect => "incorrect",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBadge {
  Excellent,
  Good,
  Fair,
  Average,
  NeedsWork,
}

impl ScoreBadge {
  pub fn for_score(score: u32) -> Self {
    match score {
      90.. => Self::Excellent,
      80..=89 => Self::Good,
      70..=79 => Self::Fair,
      60..=69 => Self::Average,
      _ => Self::NeedsWork,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Self::Excellent => "Excellent",
      Self::Good => "Good",
      Self::Fair => "Fair",
      Self::Average => "Average",
      Self::NeedsWork => "Needs work",
    }
  }

  /// Colour bucket: high >= 80, mid >= 60
  pub fn tone(&self) -> &'static str {
    match self {
      Self::Excellent | Self::Good => "high",
      Self::Fair | Self::Average => "mid",
      Self::NeedsWork => "low",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
  pub folder_id: i64,
  pub folder_name: String,
  pub mode: QuizMode,
  pub total_questions: u32,
  pub correct_count: u32,
  pub score: u32,
  pub total_time_spent: u32,
  pub answers: Vec<QuizAnswer>,
  pub questions: Vec<QuizQuestion>,
}

impl QuizOutcome {
  pub fn new(config: &QuizConfig, questions: Vec<QuizQuestion>, answers: Vec<QuizAnswer>) -> Self {
    let correct = answers.iter().filter(|a| a.is_correct).count();
    Self {
      folder_id: config.folder_id,
      folder_name: config.folder_name.clone(),
      mode: config.mode,
      total_questions: questions.len() as u32,
      correct_count: correct as u32,
      score: score(correct, questions.len()),
      total_time_spent: answers.iter().map(|a| a.time_spent).sum(),
      answers,
      questions,
    }
  }

  pub fn incorrect_count(&self) -> u32 {
    self.total_questions - self.correct_count
  }

  /// Mean seconds per answer, rounded
  pub fn average_time(&self) -> u32 {
    if self.answers.is_empty() {
      return 0;
    }
    let n = self.answers.len() as u32;
    (self.total_time_spent * 2 + n) / (2 * n)
  }

  pub fn badge(&self) -> ScoreBadge {
    ScoreBadge::for_score(self.score)
  }

  /// Answers paired with their questions, filtered
  pub fn filtered(&self, filter: ResultFilter) -> Vec<(&QuizQuestion, &QuizAnswer)> {
    self
      .questions
      .iter()
      .zip(self.answers.iter())
      .filter(|(_, a)| match filter {
        ResultFilter::All => true,
        ResultFilter::Correct => a.is_correct,
        ResultFilter::Incorrect => !a.is_correct,
      })
      .collect()
  }

  /// Words answered incorrectly
  pub fn words_to_review(&self) -> Vec<&QuizQuestion> {
    self
      .filtered(ResultFilter::Incorrect)
      .into_iter()
      .map(|(q, _)| q)
      .collect()
  }

  pub fn to_result_request(&self) -> QuizResultRequest {
    QuizResultRequest {
      vocabulary_list_id: self.folder_id,
      score: self.score,
      total_questions: self.total_questions,
      correct_count: self.correct_count,
      total_time_spent: self.total_time_spent,
      mode: self.mode.as_str().to_string(),
    }
  }

  /// One scheduler update per reviewed word
  pub fn review_requests(&self) -> Vec<ReviewVocabularyRequest> {
    self
      .answers
      .iter()
      .map(|a| ReviewVocabularyRequest::for_word(a.word_id, a.list_id, review_quality(a)))
      .collect()
  }
}

/// Grade a review answer: wrong answers are 0, right ones are graded by speed
pub fn review_quality(answer: &QuizAnswer) -> u8 {
  if !answer.is_correct {
    0
  } else if answer.time_spent < REVIEW_FAST_ANSWER_SECS {
    5
  } else if answer.time_spent < REVIEW_STEADY_ANSWER_SECS {
    4
  } else {
    3
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn answer(id: usize, correct: bool, time: u32) -> QuizAnswer {
    QuizAnswer {
      question_id: id,
      word_id: id as i64 + 100,
      list_id: 5,
      selected_answer: if correct { "right".into() } else { "wrong".into() },
      correct_answer: "right".into(),
      is_correct: correct,
      time_spent: time,
    }
  }

  fn question(id: usize) -> QuizQuestion {
    QuizQuestion {
      id,
      word_id: id as i64 + 100,
      list_id: 5,
      word: format!("w{id}"),
      question_type: super::super::generator::QuestionType::WordToMeaning,
      prompt: format!("w{id}"),
      correct_answer: "right".into(),
      options: vec!["right".into(), "wrong".into()],
      example: None,
      audio_url: None,
    }
  }

  fn outcome(marks: &[(bool, u32)]) -> QuizOutcome {
    let config = QuizConfig {
      folder_id: 5,
      folder_name: "Finance".into(),
      mode: QuizMode::Test,
      ..QuizConfig::default()
    };
    let questions = (0..marks.len()).map(question).collect();
    let answers = marks
      .iter()
      .enumerate()
      .map(|(i, (c, t))| answer(i, *c, *t))
      .collect();
    QuizOutcome::new(&config, questions, answers)
  }

  #[test]
  fn test_score_rounding() {
    assert_eq!(score(7, 10), 70);
    assert_eq!(score(1, 3), 33);
    assert_eq!(score(2, 3), 67);
    assert_eq!(score(1, 8), 13);
    assert_eq!(score(0, 0), 0);
    assert_eq!(score(4, 4), 100);
  }

  #[test]
  fn test_badges() {
    assert_eq!(ScoreBadge::for_score(95).label(), "Excellent");
    assert_eq!(ScoreBadge::for_score(80).label(), "Good");
    assert_eq!(ScoreBadge::for_score(79).label(), "Fair");
    assert_eq!(ScoreBadge::for_score(60).label(), "Average");
    assert_eq!(ScoreBadge::for_score(59).tone(), "low");
  }

  #[test]
  fn test_outcome_aggregates() {
    let o = outcome(&[(true, 4), (false, 10), (true, 7)]);
    assert_eq!(o.correct_count, 2);
    assert_eq!(o.incorrect_count(), 1);
    assert_eq!(o.score, 67);
    assert_eq!(o.total_time_spent, 21);
    assert_eq!(o.average_time(), 7);
    assert_eq!(o.filtered(ResultFilter::Correct).len(), 2);
    assert_eq!(o.words_to_review().len(), 1);
    assert_eq!(o.words_to_review()[0].word, "w1");
  }

  #[test]
  fn test_result_request_shape() {
    let req = outcome(&[(true, 3), (true, 3)]).to_result_request();
    assert_eq!(req.vocabulary_list_id, 5);
    assert_eq!(req.score, 100);
    assert_eq!(req.mode, "test");
    assert_eq!(req.total_time_spent, 6);
  }

  #[test]
  fn test_review_quality_by_speed() {
    assert_eq!(review_quality(&answer(0, false, 1)), 0);
    assert_eq!(review_quality(&answer(0, true, 4)), 5);
    assert_eq!(review_quality(&answer(0, true, 5)), 4);
    assert_eq!(review_quality(&answer(0, true, 14)), 4);
    assert_eq!(review_quality(&answer(0, true, 15)), 3);
  }

  #[test]
  fn test_review_requests_per_answer() {
    let reqs = outcome(&[(true, 2), (false, 9)]).review_requests();
    assert_eq!(reqs.len(), 2);
    assert_eq!(reqs[0].vocabulary_id, Some(100));
    assert_eq!(reqs[0].quality, 5);
    assert_eq!(reqs[1].quality, 0);
  }
}
