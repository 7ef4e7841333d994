use reqwest::Method;

use super::{ApiError, LuminaApi};
use crate::domain::{QuotaCheckResponse, SubscriptionStatus};

impl LuminaApi {
  pub async fn check_quota(&self, skill: &str) -> Result<QuotaCheckResponse, ApiError> {
    self.get_json(&format!("/Quota/check/{skill}"), &[]).await
  }

  pub async fn increment_quota(&self, skill: &str) -> Result<(), ApiError> {
    self
      .send_empty::<()>(Method::POST, &format!("/Quota/increment/{skill}"), None)
      .await
  }

  pub async fn subscription_status(&self) -> Result<SubscriptionStatus, ApiError> {
    self.get_json("/Payment/subscription-status", &[]).await
  }
}
