//! Question generation from a vocabulary pool.

use rand::Rng;
use serde::Deserialize;

use super::shuffle::shuffle;
use crate::config::{DISTRACTOR_COUNT, QUIZ_MAX_QUESTION_SECS, QUIZ_MAX_TOTAL_MINUTES};
use crate::domain::VocabularyWord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizMode {
  /// Immediate feedback, no auto-advance
  Practice,
  /// Answer required to move on, feedback only at the end
  Test,
  /// Test rules with listening questions mixed in
  Challenge,
  /// Due-word review feeding the repetition scheduler
  Review,
}

impl QuizMode {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "practice" => Some(Self::Practice),
      "test" => Some(Self::Test),
      "challenge" => Some(Self::Challenge),
      "review" => Some(Self::Review),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Practice => "practice",
      Self::Test => "test",
      Self::Challenge => "challenge",
      Self::Review => "review",
    }
  }

  /// Moving on requires a selection or an answer
  pub fn requires_answer(&self) -> bool {
    matches!(self, Self::Test | Self::Challenge)
  }

  /// Selecting an option submits it
  pub fn submits_on_select(&self) -> bool {
    matches!(self, Self::Practice | Self::Review)
  }

  pub fn auto_advances(&self) -> bool {
    !matches!(self, Self::Practice)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMode {
  PerQuestion { seconds: u32 },
  Total { minutes: u32 },
  Unlimited,
}

/// What the user asked to be quizzed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
  WordToMeaning,
  MeaningToWord,
  Mixed,
}

impl QuestionKind {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "word-to-meaning" => Some(Self::WordToMeaning),
      "meaning-to-word" => Some(Self::MeaningToWord),
      "mixed" => Some(Self::Mixed),
      _ => None,
    }
  }
}

/// Concrete type of a generated question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionType {
  WordToMeaning,
  MeaningToWord,
  Listening,
}

impl QuestionType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::WordToMeaning => "word-to-meaning",
      Self::MeaningToWord => "meaning-to-word",
      Self::Listening => "listening",
    }
  }

  /// The answer is a definition rather than the word itself
  fn asks_for_definition(&self) -> bool {
    !matches!(self, Self::MeaningToWord)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizConfig {
  pub folder_id: i64,
  pub folder_name: String,
  pub mode: QuizMode,
  pub question_count: usize,
  pub time_mode: TimeMode,
  pub question_kind: QuestionKind,
  pub shuffle_questions: bool,
  pub shuffle_answers: bool,
  pub show_examples: bool,
}

impl Default for QuizConfig {
  fn default() -> Self {
    Self {
      folder_id: 0,
      folder_name: String::new(),
      mode: QuizMode::Practice,
      question_count: 10,
      time_mode: TimeMode::PerQuestion { seconds: 30 },
      question_kind: QuestionKind::WordToMeaning,
      shuffle_questions: true,
      shuffle_answers: true,
      show_examples: true,
    }
  }
}

/// Quiz settings as posted by the setup form
#[derive(Debug, Clone, Deserialize)]
pub struct QuizConfigForm {
  pub folder_id: i64,
  #[serde(default)]
  pub folder_name: String,
  #[serde(default)]
  pub mode: Option<String>,
  #[serde(default)]
  pub question_count: Option<usize>,
  #[serde(default)]
  pub time_mode: Option<String>,
  #[serde(default)]
  pub time_per_question: Option<u32>,
  #[serde(default)]
  pub total_time: Option<u32>,
  #[serde(default)]
  pub question_type: Option<String>,
  #[serde(default)]
  pub shuffle_questions: Option<String>,
  #[serde(default)]
  pub shuffle_answers: Option<String>,
  #[serde(default)]
  pub show_examples: Option<String>,
}

impl QuizConfigForm {
  /// Unknown or missing values fall back to the defaults
  pub fn into_config(self, defaults: &QuizConfig) -> QuizConfig {
    let per_question = match defaults.time_mode {
      TimeMode::PerQuestion { seconds } => seconds,
      _ => 30,
    };
    let time_mode = match self.time_mode.as_deref() {
      Some("none") => TimeMode::Unlimited,
      Some("total") => TimeMode::Total {
        minutes: self.total_time.filter(|m| *m > 0).unwrap_or(10).min(QUIZ_MAX_TOTAL_MINUTES),
      },
      _ => TimeMode::PerQuestion {
        seconds: self
          .time_per_question
          .filter(|s| *s > 0)
          .unwrap_or(per_question)
          .min(QUIZ_MAX_QUESTION_SECS),
      },
    };
    // Checkboxes are absent when unticked
    let checked = |v: &Option<String>| v.as_deref().is_some_and(|s| s == "on" || s == "true");

    QuizConfig {
      folder_id: self.folder_id,
      folder_name: self.folder_name,
      mode: self
        .mode
        .as_deref()
        .and_then(QuizMode::from_str)
        .unwrap_or(defaults.mode),
      question_count: self
        .question_count
        .filter(|n| *n > 0)
        .unwrap_or(defaults.question_count),
      time_mode,
      question_kind: self
        .question_type
        .as_deref()
        .and_then(QuestionKind::from_str)
        .unwrap_or(defaults.question_kind),
      shuffle_questions: checked(&self.shuffle_questions),
      shuffle_answers: checked(&self.shuffle_answers),
      show_examples: checked(&self.show_examples),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
  pub id: usize,
  pub word_id: i64,
  pub list_id: i64,
  pub word: String,
  pub question_type: QuestionType,
  pub prompt: String,
  pub correct_answer: String,
  pub options: Vec<String>,
  pub example: Option<String>,
  pub audio_url: Option<String>,
}

/// Question type for the question at `index`
pub fn question_type_for(index: usize, config: &QuizConfig) -> QuestionType {
  if config.mode == QuizMode::Challenge {
    return match index % 3 {
      0 => QuestionType::WordToMeaning,
      1 => QuestionType::MeaningToWord,
      _ => QuestionType::Listening,
    };
  }
  if config.mode == QuizMode::Review || config.question_kind == QuestionKind::Mixed {
    return if index % 2 == 0 {
      QuestionType::WordToMeaning
    } else {
      QuestionType::MeaningToWord
    };
  }
  match config.question_kind {
    QuestionKind::MeaningToWord => QuestionType::MeaningToWord,
    _ => QuestionType::WordToMeaning,
  }
}

fn answer_field(word: &VocabularyWord, question_type: QuestionType) -> &str {
  if question_type.asks_for_definition() {
    &word.definition
  } else {
    &word.word
  }
}

/// Up to `DISTRACTOR_COUNT` wrong options drawn from other words. Values equal
/// to the correct answer are skipped and duplicates collapse.
pub fn pick_distractors<R: Rng + ?Sized>(
  target: &VocabularyWord,
  pool: &[VocabularyWord],
  question_type: QuestionType,
  rng: &mut R,
) -> Vec<String> {
  let correct = answer_field(target, question_type);
  let mut candidates: Vec<&str> = Vec::new();
  for word in pool.iter().filter(|w| w.id != target.id) {
    let value = answer_field(word, question_type);
    if value.is_empty() || value == correct || candidates.contains(&value) {
      continue;
    }
    candidates.push(value);
  }
  shuffle(&mut candidates, rng);
  candidates
    .into_iter()
    .take(DISTRACTOR_COUNT)
    .map(str::to_string)
    .collect()
}

pub fn generate_questions<R: Rng + ?Sized>(
  words: &[VocabularyWord],
  config: &QuizConfig,
  rng: &mut R,
) -> Vec<QuizQuestion> {
  let mut selected = words.to_vec();
  if config.shuffle_questions || config.mode == QuizMode::Review {
    shuffle(&mut selected, rng);
  }
  selected.truncate(config.question_count.min(words.len()));

  selected
    .iter()
    .enumerate()
    .map(|(index, word)| {
      let question_type = question_type_for(index, config);
      let correct_answer = answer_field(word, question_type).to_string();
      let prompt = match question_type {
        QuestionType::MeaningToWord => word.definition.clone(),
        QuestionType::WordToMeaning | QuestionType::Listening => word.word.clone(),
      };

      let mut options = pick_distractors(word, words, question_type, rng);
      options.push(correct_answer.clone());
      if config.shuffle_answers || config.mode == QuizMode::Review {
        shuffle(&mut options, rng);
      }

      QuizQuestion {
        id: index,
        word_id: word.id,
        list_id: word.list_id,
        word: word.word.clone(),
        question_type,
        prompt,
        correct_answer,
        options,
        example: if config.show_examples { word.example.clone() } else { None },
        audio_url: word.audio_url.clone(),
      }
    })
    .collect()
}
