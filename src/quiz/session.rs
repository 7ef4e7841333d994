//! Quiz session state machine.
//!
//! `Loading -> InProgress -> Finished`. Each question starts unanswered and
//! is answered at most once. Time is driven by [`QuizSession::tick`], one call
//! per elapsed second.

use rand::Rng;
use thiserror::Error;

use super::generator::{QuizConfig, QuizMode, QuizQuestion, TimeMode, generate_questions};
use super::results::QuizOutcome;
use crate::domain::VocabularyWord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
  Loading,
  InProgress,
  Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAnswer {
  pub question_id: usize,
  pub word_id: i64,
  pub list_id: i64,
  pub selected_answer: String,
  pub correct_answer: String,
  pub is_correct: bool,
  pub time_spent: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
  #[error("this list has no words to quiz")]
  NoWords,
  #[error("quiz is not in progress")]
  NotInProgress,
  #[error("select an answer first")]
  NoSelection,
  #[error("question already answered")]
  AlreadyAnswered,
}

/// What a tick did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
  Idle,
  Running,
  /// The current question ran out of time
  QuestionExpired,
  Finished,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
  config: QuizConfig,
  phase: QuizPhase,
  questions: Vec<QuizQuestion>,
  answers: Vec<Option<QuizAnswer>>,
  drafts: Vec<Option<String>>,
  elapsed: Vec<u32>,
  timed_out: Vec<bool>,
  current: usize,
  question_remaining: Option<u32>,
  total_remaining: Option<u32>,
  last_answered: Option<usize>,
  outcome: Option<QuizOutcome>,
}

impl QuizSession {
  pub fn new(config: QuizConfig) -> Self {
    Self {
      config,
      phase: QuizPhase::Loading,
      questions: Vec::new(),
      answers: Vec::new(),
      drafts: Vec::new(),
      elapsed: Vec::new(),
      timed_out: Vec::new(),
      current: 0,
      question_remaining: None,
      total_remaining: None,
      last_answered: None,
      outcome: None,
    }
  }

  /// Generate questions and start the first one. An empty pool leaves the
  /// session in `Loading`.
  pub fn load<R: Rng + ?Sized>(&mut self, words: &[VocabularyWord], rng: &mut R) -> Result<(), QuizError> {
    if words.is_empty() {
      return Err(QuizError::NoWords);
    }
    self.start_with(generate_questions(words, &self.config, rng))
  }

  /// Start from prepared questions
  pub fn start_with(&mut self, questions: Vec<QuizQuestion>) -> Result<(), QuizError> {
    if questions.is_empty() {
      return Err(QuizError::NoWords);
    }
    let n = questions.len();
    self.questions = questions;
    self.answers = vec![None; n];
    self.drafts = vec![None; n];
    self.elapsed = vec![0; n];
    self.timed_out = vec![false; n];
    self.current = 0;
    self.last_answered = None;
    self.outcome = None;
    self.total_remaining = match self.config.time_mode {
      TimeMode::Total { minutes } => Some(minutes.saturating_mul(60)),
      _ => None,
    };
    self.phase = QuizPhase::InProgress;
    self.start_question_timer();
    tracing::debug!(
      "Quiz started: {} questions, mode {}",
      n,
      self.config.mode.as_str()
    );
    Ok(())
  }

  fn start_question_timer(&mut self) {
    self.question_remaining = match self.config.time_mode {
      TimeMode::PerQuestion { seconds } if self.answers[self.current].is_none() => Some(seconds),
      _ => None,
    };
  }

  fn ensure_in_progress(&self) -> Result<(), QuizError> {
    if self.phase == QuizPhase::InProgress {
      Ok(())
    } else {
      Err(QuizError::NotInProgress)
    }
  }

  /// Choose an option for the current question. Ignored once answered.
  pub fn select_answer(&mut self, answer: &str) -> Result<(), QuizError> {
    self.ensure_in_progress()?;
    if self.answers[self.current].is_some() {
      return Ok(());
    }
    self.drafts[self.current] = Some(answer.to_string());
    if self.config.mode.submits_on_select() {
      self.submit_answer()?;
    }
    Ok(())
  }

  /// Lock in the current selection
  pub fn submit_answer(&mut self) -> Result<(), QuizError> {
    self.ensure_in_progress()?;
    if self.answers[self.current].is_some() {
      return Err(QuizError::AlreadyAnswered);
    }
    let selected = self.drafts[self.current].clone().ok_or(QuizError::NoSelection)?;
    self.record_answer(selected);
    Ok(())
  }

  fn record_answer(&mut self, selected: String) {
    let index = self.current;
    let question = &self.questions[index];
    let is_correct = !selected.is_empty() && selected == question.correct_answer;
    self.answers[index] = Some(QuizAnswer {
      question_id: question.id,
      word_id: question.word_id,
      list_id: question.list_id,
      selected_answer: selected,
      correct_answer: question.correct_answer.clone(),
      is_correct,
      time_spent: self.elapsed[index],
    });
    self.question_remaining = None;
    self.last_answered = Some(index);

    if self.config.mode.auto_advances() {
      self.advance_or_finish();
    }
  }

  fn advance_or_finish(&mut self) {
    if self.current + 1 < self.questions.len() {
      self.current += 1;
      self.start_question_timer();
    } else {
      self.finish();
    }
  }

  pub fn next(&mut self) -> Result<(), QuizError> {
    self.ensure_in_progress()?;
    if self.config.mode.requires_answer()
      && self.answers[self.current].is_none()
      && self.drafts[self.current].is_none()
    {
      return Err(QuizError::NoSelection);
    }
    self.advance_or_finish();
    Ok(())
  }

  /// Go back one question; the earlier draft is kept and its timer restarts
  pub fn previous(&mut self) -> Result<(), QuizError> {
    self.ensure_in_progress()?;
    if self.current > 0 {
      self.current -= 1;
      self.start_question_timer();
    }
    Ok(())
  }

  /// Advance the clocks by one second
  pub fn tick(&mut self) -> TickOutcome {
    if self.phase != QuizPhase::InProgress {
      return TickOutcome::Idle;
    }
    let index = self.current;
    if self.answers[index].is_none() {
      self.elapsed[index] += 1;
    }

    if let Some(total) = self.total_remaining.as_mut() {
      *total = total.saturating_sub(1);
      if *total == 0 {
        tracing::debug!("Quiz time budget exhausted");
        self.finish();
        return TickOutcome::Finished;
      }
    }

    let Some(remaining) = self.question_remaining.as_mut() else {
      return TickOutcome::Running;
    };
    *remaining = remaining.saturating_sub(1);
    if *remaining > 0 {
      return TickOutcome::Running;
    }

    self.question_remaining = None;
    self.timed_out[index] = true;
    if self.config.mode != QuizMode::Practice {
      let selected = self.drafts[index].clone().unwrap_or_default();
      self.record_answer(selected);
    }
    if self.phase == QuizPhase::Finished {
      TickOutcome::Finished
    } else {
      TickOutcome::QuestionExpired
    }
  }

  /// Apply `seconds` ticks, stopping early once the quiz ends
  pub fn advance(&mut self, seconds: u64) -> TickOutcome {
    let mut last = TickOutcome::Idle;
    for _ in 0..seconds {
      last = self.tick();
      if last == TickOutcome::Finished || last == TickOutcome::Idle {
        break;
      }
    }
    last
  }

  /// End the quiz, treating every unanswered question as answered with its
  /// draft (or nothing).
  pub fn finish(&mut self) -> Option<&QuizOutcome> {
    if self.phase == QuizPhase::Loading {
      return None;
    }
    if self.phase == QuizPhase::InProgress {
      let current = self.current;
      let answers: Vec<QuizAnswer> = self
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| match &self.answers[i] {
          Some(a) => a.clone(),
          None => {
            let selected = self.drafts[i].clone().unwrap_or_default();
            QuizAnswer {
              question_id: q.id,
              word_id: q.word_id,
              list_id: q.list_id,
              is_correct: !selected.is_empty() && selected == q.correct_answer,
              selected_answer: selected,
              correct_answer: q.correct_answer.clone(),
              time_spent: if i == current { self.elapsed[i] } else { 0 },
            }
          }
        })
        .collect();
      self.answers = answers.iter().cloned().map(Some).collect();
      self.question_remaining = None;
      self.phase = QuizPhase::Finished;
      let outcome = QuizOutcome::new(&self.config, self.questions.clone(), answers);
      tracing::info!(
        "Quiz finished: {}/{} correct, score {}",
        outcome.correct_count,
        outcome.total_questions,
        outcome.score
      );
      self.outcome = Some(outcome);
    }
    self.outcome.as_ref()
  }

  pub fn phase(&self) -> QuizPhase {
    self.phase
  }

  pub fn config(&self) -> &QuizConfig {
    &self.config
  }

  pub fn current_index(&self) -> usize {
    self.current
  }

  pub fn current_question(&self) -> Option<&QuizQuestion> {
    self.questions.get(self.current)
  }

  pub fn current_answer(&self) -> Option<&QuizAnswer> {
    self.answers.get(self.current).and_then(Option::as_ref)
  }

  pub fn current_draft(&self) -> Option<&str> {
    self.drafts.get(self.current).and_then(|d| d.as_deref())
  }

  /// Answer recorded most recently, for feedback after auto-advance
  pub fn last_answer(&self) -> Option<&QuizAnswer> {
    self.last_answered.and_then(|i| self.answers.get(i)).and_then(Option::as_ref)
  }

  pub fn current_timed_out(&self) -> bool {
    self.timed_out.get(self.current).copied().unwrap_or(false)
  }

  pub fn question_count(&self) -> usize {
    self.questions.len()
  }

  pub fn answered_count(&self) -> usize {
    self.answers.iter().filter(|a| a.is_some()).count()
  }

  pub fn question_remaining(&self) -> Option<u32> {
    self.question_remaining
  }

  pub fn total_remaining(&self) -> Option<u32> {
    self.total_remaining
  }

  pub fn outcome(&self) -> Option<&QuizOutcome> {
    self.outcome.as_ref()
  }
}
