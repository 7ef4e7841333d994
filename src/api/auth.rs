use chrono::Utc;
use reqwest::Method;

use super::{ApiError, LuminaApi};
use crate::domain::{LoginRequest, LoginResponse, RefreshRequest};

impl LuminaApi {
  /// POST /auth/login; on success the session adopts the new credentials
  pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
    let body = LoginRequest {
      username: username.to_string(),
      password: password.to_string(),
    };
    let resp = self
      .execute_anonymous(Method::POST, "/auth/login", Some(&body))
      .await?;
    let login: LoginResponse = Self::decode(resp).await?;
    self.auth.establish(&login, Utc::now());
    Ok(login)
  }

  /// POST /auth/refresh with the stored refresh token
  pub async fn refresh(&self) -> Result<(), ApiError> {
    let refresh_token = self.auth.refresh_token().ok_or(ApiError::Unauthorized)?;
    let body = RefreshRequest { refresh_token };
    let resp = self
      .execute_anonymous(Method::POST, "/auth/refresh", Some(&body))
      .await?;
    let login: LoginResponse = Self::decode(resp).await?;
    self.auth.establish(&login, Utc::now());
    tracing::debug!("Access token refreshed for {}", login.user.username);
    Ok(())
  }

  /// Drop local credentials; the backend keeps no server-side session
  pub fn logout(&self) {
    self.auth.clear();
  }
}
