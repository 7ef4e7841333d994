use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
  pub username: String,
  pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
  pub refresh_token: String,
}

/// Signed-in user as cached by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
  pub id: i64,
  pub username: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub role_id: Option<i64>,
}

impl AuthUser {
  pub fn role(&self) -> Role {
    self.role_id.map(Role::from_id).unwrap_or(Role::User)
  }

  pub fn display_name(&self) -> &str {
    if self.name.is_empty() {
      &self.username
    } else {
      &self.name
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  Admin,
  Manager,
  Staff,
  User,
}

impl Role {
  pub fn from_id(id: i64) -> Self {
    match id {
      1 => Self::Admin,
      2 => Self::Manager,
      3 => Self::Staff,
      _ => Self::User,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Admin => "admin",
      Self::Manager => "manager",
      Self::Staff => "staff",
      Self::User => "user",
    }
  }
}

/// `/auth/login` and `/auth/refresh` response; `expires_in` is in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
  pub token: String,
  #[serde(default)]
  pub expires_in: i64,
  #[serde(default)]
  pub refresh_token: Option<String>,
  pub user: AuthUser,
}
