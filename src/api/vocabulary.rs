use reqwest::Method;

use super::{ApiError, LuminaApi};
use crate::domain::{QuizResultRequest, QuizScore, VocabularyList, VocabularyWord, merge_scores};

impl LuminaApi {
  /// GET /vocabularies?listId=
  pub async fn list_words(&self, list_id: i64) -> Result<Vec<VocabularyWord>, ApiError> {
    self
      .get_json("/vocabularies", &[("listId", list_id.to_string())])
      .await
  }

  /// GET /vocabulary-lists/public/{id}/vocabularies
  pub async fn public_list_words(&self, list_id: i64) -> Result<Vec<VocabularyWord>, ApiError> {
    self
      .get_json(&format!("/vocabulary-lists/public/{list_id}/vocabularies"), &[])
      .await
  }

  /// Lists owned by the user plus staff-published ones
  pub async fn my_and_staff_lists(&self) -> Result<Vec<VocabularyList>, ApiError> {
    self.get_json("/vocabulary-lists/my-and-staff", &[]).await
  }

  pub async fn quiz_scores(&self) -> Result<Vec<QuizScore>, ApiError> {
    self.get_json("/vocabulary-lists/quiz-scores", &[]).await
  }

  /// Lists with quiz history merged in. Missing history is not an error.
  pub async fn lists_with_scores(&self) -> Result<Vec<VocabularyList>, ApiError> {
    let mut lists = self.my_and_staff_lists().await?;
    match self.quiz_scores().await {
      Ok(scores) => merge_scores(&mut lists, &scores),
      Err(ApiError::NotFound(_)) => {}
      Err(e) => tracing::warn!("Could not load quiz scores: {}", e),
    }
    Ok(lists)
  }

  /// POST /vocabulary-lists/quiz-results
  pub async fn save_quiz_result(&self, result: &QuizResultRequest) -> Result<(), ApiError> {
    self
      .send_empty(Method::POST, "/vocabulary-lists/quiz-results", Some(result))
      .await
  }
}
