use reqwest::Method;

use super::{ApiError, LuminaApi};
use crate::domain::{RepetitionRecord, ReviewVocabularyRequest, ReviewVocabularyResponse};

impl LuminaApi {
  /// GET /spaced-repetition/due
  pub async fn due_for_review(&self) -> Result<Vec<RepetitionRecord>, ApiError> {
    self.get_json("/spaced-repetition/due", &[]).await
  }

  /// GET /spaced-repetition/all
  pub async fn all_repetitions(&self) -> Result<Vec<RepetitionRecord>, ApiError> {
    self.get_json("/spaced-repetition/all", &[]).await
  }

  /// POST /spaced-repetition/review
  pub async fn review_vocabulary(
    &self,
    request: &ReviewVocabularyRequest,
  ) -> Result<ReviewVocabularyResponse, ApiError> {
    self
      .send_json(Method::POST, "/spaced-repetition/review", Some(request))
      .await
  }

  /// GET /spaced-repetition/by-list/{id}; `None` when the list was never studied
  pub async fn repetition_by_list(&self, list_id: i64) -> Result<Option<RepetitionRecord>, ApiError> {
    match self
      .get_json(&format!("/spaced-repetition/by-list/{list_id}"), &[])
      .await
    {
      Ok(record) => Ok(Some(record)),
      Err(ApiError::NotFound(_)) => Ok(None),
      Err(e) => Err(e),
    }
  }

  /// POST /spaced-repetition/create/{id}
  pub async fn create_repetition(&self, list_id: i64) -> Result<RepetitionRecord, ApiError> {
    self
      .send_json::<_, ()>(Method::POST, &format!("/spaced-repetition/create/{list_id}"), None)
      .await
  }
}
