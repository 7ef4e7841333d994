//! Shared fixtures for integration tests: a throwaway client store and a
//! local stand-in for the Lumina backend.

#![allow(dead_code)]

use axum::Router;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use lumina_client::api::{self, LuminaApi};
use lumina_client::auth::AuthSession;
use lumina_client::db::{self, DbPool};
use lumina_client::domain::{AuthUser, LoginResponse};

/// Client store in a temporary directory, removed on drop
pub struct TestEnv {
  pub temp: TempDir,
  pub db: DbPool,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let db = db::init_db(&temp.path().join("client.db")).unwrap();
    Self { temp, db }
  }
}

/// Serve `router` on an ephemeral port and return its origin
pub async fn serve(router: Router) -> String {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, router).await.unwrap();
  });
  format!("http://{}", addr)
}

/// Origin of a port nothing is listening on
pub async fn dead_origin() -> String {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);
  format!("http://{}", addr)
}

pub fn user() -> AuthUser {
  AuthUser {
    id: 7,
    username: "mai".to_string(),
    email: "mai@example.com".to_string(),
    name: "Mai Tran".to_string(),
    role_id: Some(4),
  }
}

pub fn login_response(token: &str, expires_in: i64) -> LoginResponse {
  LoginResponse {
    token: token.to_string(),
    expires_in,
    refresh_token: Some(format!("{}-refresh", token)),
    user: user(),
  }
}

/// Auth store already holding a token valid for an hour
pub fn signed_in(session_id: &str, storage: Option<DbPool>, token: &str) -> Arc<AuthSession> {
  let auth = AuthSession::new(session_id, storage);
  auth.establish(&login_response(token, 3600), Utc::now());
  Arc::new(auth)
}

pub fn api_for(base_url: &str, auth: Arc<AuthSession>) -> LuminaApi {
  LuminaApi::new(api::build_http_client(Duration::from_secs(5)), base_url, auth)
}

pub fn word_json(id: i64, list_id: i64, word: &str, definition: &str) -> serde_json::Value {
  serde_json::json!({
    "id": id,
    "listId": list_id,
    "word": word,
    "type": "noun",
    "definition": definition,
  })
}
