use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionType {
  Free,
  Premium,
}

/// `/Quota/check/{skill}` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaCheckResponse {
  pub can_access: bool,
  #[serde(default)]
  pub is_premium: bool,
  #[serde(default)]
  pub requires_upgrade: bool,
  #[serde(default)]
  pub remaining_attempts: i64,
  pub subscription_type: SubscriptionType,
  #[serde(default)]
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
  #[serde(default)]
  pub has_active_subscription: bool,
  #[serde(default)]
  pub subscription_type: Option<SubscriptionType>,
}
