use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lenient_datetime;

/// Learning stage reported by the backend scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepetitionStatus {
  New,
  Learning,
  Mastered,
  #[serde(other)]
  Unknown,
}

impl RepetitionStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::New => "New",
      Self::Learning => "Learning",
      Self::Mastered => "Mastered",
      Self::Unknown => "Unknown",
    }
  }
}

/// Review-state record for a word (or a whole list when `vocabulary_id` is empty).
///
/// Intervals, due dates and status transitions are computed server-side;
/// the client only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepetitionRecord {
  pub user_spaced_repetition_id: i64,
  #[serde(default)]
  pub user_id: i64,
  #[serde(default)]
  pub vocabulary_id: Option<i64>,
  pub vocabulary_list_id: i64,
  #[serde(default)]
  pub vocabulary_list_name: String,
  #[serde(default)]
  pub vocabulary_word: Option<String>,
  #[serde(default, with = "lenient_datetime::option")]
  pub last_reviewed_at: Option<DateTime<Utc>>,
  #[serde(default, with = "lenient_datetime::option")]
  pub next_review_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub review_count: u32,
  #[serde(default)]
  pub intervals: u32,
  pub status: RepetitionStatus,
  #[serde(default)]
  pub is_due: bool,
  #[serde(default)]
  pub days_until_review: i64,
  #[serde(default)]
  pub best_quiz_score: Option<u32>,
  #[serde(default)]
  pub last_quiz_score: Option<u32>,
  #[serde(default, with = "lenient_datetime::option")]
  pub last_quiz_completed_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub total_quiz_attempts: Option<u32>,
}

impl RepetitionRecord {
  pub fn is_word_level(&self) -> bool {
    self.vocabulary_id.is_some()
  }
}

/// Outcome of one review, graded 0..=5
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewVocabularyRequest {
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub user_spaced_repetition_id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub vocabulary_id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub vocabulary_list_id: Option<i64>,
  pub quality: u8,
}

impl ReviewVocabularyRequest {
  pub fn for_word(vocabulary_id: i64, vocabulary_list_id: i64, quality: u8) -> Self {
    Self {
      user_spaced_repetition_id: None,
      vocabulary_id: Some(vocabulary_id),
      vocabulary_list_id: Some(vocabulary_list_id),
      quality: quality.min(5),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewVocabularyResponse {
  pub success: bool,
  #[serde(default)]
  pub message: String,
  #[serde(default)]
  pub updated_repetition: Option<RepetitionRecord>,
  #[serde(default, with = "lenient_datetime::option")]
  pub next_review_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub new_intervals: u32,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_record_deserializes_backend_shape() {
    let json = r#"{
      "userSpacedRepetitionId": 11,
      "userId": 4,
      "vocabularyId": 70,
      "vocabularyListId": 2,
      "vocabularyListName": "Travel",
      "vocabularyWord": "itinerary",
      "lastReviewedAt": "2024-06-01T10:00:00",
      "nextReviewAt": "2024-06-07T10:00:00Z",
      "reviewCount": 3,
      "intervals": 6,
      "status": "Learning",
      "isDue": false,
      "daysUntilReview": 6
    }"#;
    let rec: RepetitionRecord = serde_json::from_str(json).unwrap();
    assert!(rec.is_word_level());
    assert_eq!(rec.status, RepetitionStatus::Learning);
    assert_eq!(rec.intervals, 6);
    assert!(rec.next_review_at.is_some());
    assert!(rec.last_quiz_score.is_none());
  }

  #[test]
  fn test_unknown_status_is_tolerated() {
    let json = r#"{"userSpacedRepetitionId":1,"vocabularyListId":2,"status":"Suspended"}"#;
    let rec: RepetitionRecord = serde_json::from_str(json).unwrap();
    assert_eq!(rec.status, RepetitionStatus::Unknown);
    assert!(!rec.is_word_level());
  }

  #[test]
  fn test_review_request_omits_missing_ids() {
    let req = ReviewVocabularyRequest::for_word(5, 9, 7);
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["quality"], 5);
    assert_eq!(json["vocabularyId"], 5);
    assert!(json.get("userSpacedRepetitionId").is_none());
  }
}
