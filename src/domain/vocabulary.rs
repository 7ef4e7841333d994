use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lenient_datetime;

/// A single word inside a vocabulary list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyWord {
  pub id: i64,
  pub list_id: i64,
  pub word: String,
  #[serde(rename = "type", default)]
  pub word_type: String,
  #[serde(default)]
  pub category: Option<String>,
  pub definition: String,
  #[serde(default)]
  pub example: Option<String>,
  #[serde(default)]
  pub audio_url: Option<String>,
  #[serde(default)]
  pub image_url: Option<String>,
}

/// Publication workflow of a user-created list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStatus {
  Draft,
  Pending,
  Published,
  Rejected,
  #[serde(other)]
  Unknown,
}

impl ApprovalStatus {
  pub fn from_str(s: &str) -> Self {
    match s {
      "Draft" | "draft" => Self::Draft,
      "Pending" | "pending" => Self::Pending,
      "Published" | "published" => Self::Published,
      "Rejected" | "rejected" => Self::Rejected,
      _ => Self::Unknown,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Draft => "Draft",
      Self::Pending => "Pending",
      Self::Published => "Published",
      Self::Rejected => "Rejected",
      Self::Unknown => "Unknown",
    }
  }
}

/// Vocabulary list summary as returned by the list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyList {
  pub vocabulary_list_id: i64,
  pub name: String,
  #[serde(default)]
  pub is_public: Option<bool>,
  #[serde(default)]
  pub make_by_name: String,
  #[serde(default)]
  pub make_by_role_id: Option<i64>,
  #[serde(default, with = "lenient_datetime::option")]
  pub create_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub vocabulary_count: u32,
  #[serde(default)]
  pub status: Option<ApprovalStatus>,
  #[serde(default)]
  pub rejection_reason: Option<String>,
  #[serde(default)]
  pub best_score: Option<u32>,
  #[serde(default)]
  pub last_score: Option<u32>,
  #[serde(default, with = "lenient_datetime::option")]
  pub last_completed_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub total_attempts: Option<u32>,
}

impl VocabularyList {
  /// Only lists with words can host a quiz
  pub fn is_playable(&self) -> bool {
    self.vocabulary_count > 0
  }

  pub fn apply_score(&mut self, score: &QuizScore) {
    self.best_score = Some(score.best_score);
    self.last_score = Some(score.last_score);
    self.last_completed_at = score.last_completed_at;
    self.total_attempts = Some(score.total_attempts);
  }
}

/// Per-list quiz history kept by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizScore {
  pub vocabulary_list_id: i64,
  #[serde(default)]
  pub best_score: u32,
  #[serde(default)]
  pub last_score: u32,
  #[serde(default, with = "lenient_datetime::option")]
  pub last_completed_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub total_attempts: u32,
}

/// Merge quiz history into lists by id
pub fn merge_scores(lists: &mut [VocabularyList], scores: &[QuizScore]) {
  for list in lists.iter_mut() {
    if let Some(score) = scores
      .iter()
      .find(|s| s.vocabulary_list_id == list.vocabulary_list_id)
    {
      list.apply_score(score);
    }
  }
}

/// Completed quiz submitted back to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResultRequest {
  pub vocabulary_list_id: i64,
  pub score: u32,
  pub total_questions: u32,
  pub correct_count: u32,
  pub total_time_spent: u32,
  pub mode: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_word_deserializes_type_field() {
    let json = r#"{"id":3,"listId":9,"word":"reliable","type":"adjective","definition":"dependable"}"#;
    let word: VocabularyWord = serde_json::from_str(json).unwrap();
    assert_eq!(word.word_type, "adjective");
    assert_eq!(word.list_id, 9);
    assert!(word.example.is_none());
  }

  #[test]
  fn test_list_tolerates_unknown_status() {
    let json = r#"{"vocabularyListId":1,"name":"Office","makeByName":"staff","createAt":"2024-05-01T08:00:00","vocabularyCount":12,"status":"Archived"}"#;
    let list: VocabularyList = serde_json::from_str(json).unwrap();
    assert_eq!(list.status, Some(ApprovalStatus::Unknown));
    assert!(list.create_at.is_some());
    assert!(list.is_playable());
  }

  #[test]
  fn test_merge_scores_matches_by_id() {
    let mut lists = vec![
      serde_json::from_str::<VocabularyList>(
        r#"{"vocabularyListId":1,"name":"A","vocabularyCount":4}"#,
      )
      .unwrap(),
      serde_json::from_str::<VocabularyList>(
        r#"{"vocabularyListId":2,"name":"B","vocabularyCount":0}"#,
      )
      .unwrap(),
    ];
    let scores = vec![QuizScore {
      vocabulary_list_id: 2,
      best_score: 90,
      last_score: 70,
      last_completed_at: None,
      total_attempts: 3,
    }];

    merge_scores(&mut lists, &scores);

    assert_eq!(lists[0].best_score, None);
    assert_eq!(lists[1].best_score, Some(90));
    assert_eq!(lists[1].total_attempts, Some(3));
    assert!(!lists[1].is_playable());
  }

  #[test]
  fn test_approval_status_round_trip_names() {
    for status in [
      ApprovalStatus::Draft,
      ApprovalStatus::Pending,
      ApprovalStatus::Published,
      ApprovalStatus::Rejected,
    ] {
      assert_eq!(ApprovalStatus::from_str(status.as_str()), status);
    }
  }
}
