//! Free-tier quota gate for exam skills.

use crate::api::{ApiError, LuminaApi};
use crate::domain::QuotaCheckResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
  Allowed { remaining: i64 },
  Exhausted { remaining: i64 },
  UpgradeRequired,
}

impl QuotaDecision {
  pub fn is_allowed(&self) -> bool {
    matches!(self, Self::Allowed { .. })
  }

  /// Failed checks let the user through; the backend still enforces limits
  pub fn from_result(result: Result<QuotaCheckResponse, ApiError>) -> Self {
    match result {
      Ok(check) => Self::from(&check),
      Err(e) => {
        tracing::warn!("Quota check failed, allowing access: {}", e);
        Self::Allowed { remaining: -1 }
      }
    }
  }
}

impl From<&QuotaCheckResponse> for QuotaDecision {
  fn from(check: &QuotaCheckResponse) -> Self {
    if check.requires_upgrade {
      Self::UpgradeRequired
    } else if !check.can_access {
      Self::Exhausted {
        remaining: check.remaining_attempts,
      }
    } else {
      Self::Allowed {
        remaining: check.remaining_attempts,
      }
    }
  }
}

pub async fn check_skill(api: &LuminaApi, skill: &str) -> QuotaDecision {
  QuotaDecision::from_result(api.check_quota(skill).await)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::SubscriptionType;

  fn check(can_access: bool, requires_upgrade: bool, remaining: i64) -> QuotaCheckResponse {
    QuotaCheckResponse {
      can_access,
      is_premium: false,
      requires_upgrade,
      remaining_attempts: remaining,
      subscription_type: SubscriptionType::Free,
      message: String::new(),
    }
  }

  #[test]
  fn test_decision_from_check() {
    assert_eq!(
      QuotaDecision::from(&check(true, false, 3)),
      QuotaDecision::Allowed { remaining: 3 }
    );
    assert_eq!(
      QuotaDecision::from(&check(false, false, 0)),
      QuotaDecision::Exhausted { remaining: 0 }
    );
    assert_eq!(
      QuotaDecision::from(&check(false, true, 0)),
      QuotaDecision::UpgradeRequired
    );
  }

  #[test]
  fn test_failed_check_fails_open() {
    let decision = QuotaDecision::from_result(Err(ApiError::Network("down".into())));
    assert!(decision.is_allowed());
  }
}
