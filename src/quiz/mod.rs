//! Multiple-choice vocabulary quizzes.

pub mod generator;
pub mod results;
pub mod review;
pub mod session;
pub mod shuffle;

pub use generator::{
  QuestionKind, QuestionType, QuizConfig, QuizConfigForm, QuizMode, QuizQuestion, TimeMode,
  generate_questions,
};
pub use results::{QuizOutcome, ResultFilter, ScoreBadge, review_quality, score};
pub use session::{QuizAnswer, QuizError, QuizPhase, QuizSession, TickOutcome};
pub use shuffle::{shuffle, shuffled};

use std::time::Instant;

/// A quiz bound to wall-clock time. Whole seconds elapsed since the last
/// sync are replayed as ticks before each interaction.
#[derive(Debug, Clone)]
pub struct QuizRun {
  pub session: QuizSession,
  synced_at: Instant,
  reported: bool,
}

impl QuizRun {
  pub fn new(session: QuizSession) -> Self {
    Self {
      session,
      synced_at: Instant::now(),
      reported: false,
    }
  }

  /// The finished outcome, handed out once for reporting to the backend
  pub fn take_unreported(&mut self) -> Option<QuizOutcome> {
    if self.reported {
      return None;
    }
    let outcome = self.session.outcome()?.clone();
    self.reported = true;
    Some(outcome)
  }

  pub fn catch_up(&mut self, now: Instant) -> TickOutcome {
    let elapsed = now.saturating_duration_since(self.synced_at).as_secs();
    if elapsed == 0 {
      return TickOutcome::Running;
    }
    self.synced_at += std::time::Duration::from_secs(elapsed);
    self.session.advance(elapsed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::quiz::generator::tests::ten_words;
  use rand::SeedableRng;
  use rand::rngs::StdRng;
  use std::time::Duration;

  #[test]
  fn test_catch_up_replays_whole_seconds() {
    let config = QuizConfig {
      mode: QuizMode::Test,
      time_mode: TimeMode::PerQuestion { seconds: 10 },
      ..QuizConfig::default()
    };
    let mut session = QuizSession::new(config);
    session.load(&ten_words(), &mut StdRng::seed_from_u64(1)).unwrap();
    let mut run = QuizRun::new(session);
    let start = run.synced_at;

    run.catch_up(start + Duration::from_millis(2500));
    assert_eq!(run.session.question_remaining(), Some(8));

    // the leftover half second carries into the next sync
    run.catch_up(start + Duration::from_millis(3000));
    assert_eq!(run.session.question_remaining(), Some(7));

    run.catch_up(start + Duration::from_secs(13));
    assert_eq!(run.session.current_index(), 1);
  }

  #[test]
  fn test_outcome_reported_once() {
    let mut session = QuizSession::new(QuizConfig::default());
    session.load(&ten_words(), &mut StdRng::seed_from_u64(2)).unwrap();
    let mut run = QuizRun::new(session);
    assert!(run.take_unreported().is_none());

    run.session.finish();
    assert!(run.take_unreported().is_some());
    assert!(run.take_unreported().is_none());
  }
}
