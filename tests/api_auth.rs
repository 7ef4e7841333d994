mod common;

use axum::{
  Json, Router,
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
  routing::{get, post},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{api_for, login_response, serve, signed_in};
use lumina_client::api::ApiError;

fn bearer(headers: &HeaderMap) -> String {
  headers
    .get("authorization")
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default()
    .to_string()
}

/// Backend that only accepts "fresh" and counts refreshes
fn refreshing_backend(refreshes: Arc<AtomicUsize>, refresh_ok: bool) -> Router {
  Router::new()
    .route(
      "/auth/refresh",
      post(move || {
        let refreshes = refreshes.clone();
        async move {
          refreshes.fetch_add(1, Ordering::SeqCst);
          if refresh_ok {
            Json(login_response("fresh", 3600)).into_response()
          } else {
            StatusCode::UNAUTHORIZED.into_response()
          }
        }
      }),
    )
    .route(
      "/spaced-repetition/due",
      get(|headers: HeaderMap| async move {
        if bearer(&headers) == "Bearer fresh" {
          Json(serde_json::json!([])).into_response()
        } else {
          StatusCode::UNAUTHORIZED.into_response()
        }
      }),
    )
}

#[tokio::test]
async fn test_unauthorized_refreshes_once_and_retries() {
  let refreshes = Arc::new(AtomicUsize::new(0));
  let base = serve(refreshing_backend(refreshes.clone(), true)).await;
  let auth = signed_in("s1", None, "stale");
  let api = api_for(&base, auth.clone());

  let due = api.due_for_review().await.unwrap();
  assert!(due.is_empty());
  assert_eq!(refreshes.load(Ordering::SeqCst), 1);
  assert_eq!(auth.token().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_concurrent_unauthorized_share_one_refresh() {
  let refreshes = Arc::new(AtomicUsize::new(0));
  let base = serve(refreshing_backend(refreshes.clone(), true)).await;
  let api = api_for(&base, signed_in("s1", None, "stale"));

  let (a, b) = tokio::join!(api.due_for_review(), api.due_for_review());
  assert!(a.is_ok());
  assert!(b.is_ok());
  assert_eq!(refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_refresh_signs_out() {
  let refreshes = Arc::new(AtomicUsize::new(0));
  let base = serve(refreshing_backend(refreshes.clone(), false)).await;
  let auth = signed_in("s1", None, "stale");
  let api = api_for(&base, auth.clone());

  let err = api.due_for_review().await.unwrap_err();
  assert_eq!(err, ApiError::Unauthorized);
  assert!(!auth.is_signed_in());
  assert!(auth.current_user().is_none());
}

#[tokio::test]
async fn test_signed_out_request_never_reaches_backend() {
  let refreshes = Arc::new(AtomicUsize::new(0));
  let base = serve(refreshing_backend(refreshes.clone(), true)).await;
  let auth = Arc::new(lumina_client::auth::AuthSession::detached());
  let api = api_for(&base, auth);

  assert_eq!(api.due_for_review().await.unwrap_err(), ApiError::NotSignedIn);
  assert_eq!(refreshes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_login_rejection_keeps_session_signed_out() {
  let router = Router::new().route(
    "/auth/login",
    post(|| async {
      (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "message": "Invalid credentials" })),
      )
    }),
  );
  let base = serve(router).await;
  let auth = Arc::new(lumina_client::auth::AuthSession::detached());
  let api = api_for(&base, auth.clone());

  assert_eq!(api.login("mai", "wrong").await.unwrap_err(), ApiError::Unauthorized);
  assert!(!auth.is_signed_in());
}

#[tokio::test]
async fn test_login_persists_credentials() {
  let env = common::TestEnv::new();
  let router = Router::new().route(
    "/auth/login",
    post(|| async { Json(login_response("tok-1", 3600)) }),
  );
  let base = serve(router).await;
  let auth = Arc::new(lumina_client::auth::AuthSession::new("s1", Some(env.db.clone())));
  let api = api_for(&base, auth.clone());

  let login = api.login("mai", "secret").await.unwrap();
  assert_eq!(login.user.username, "mai");

  // A new store for the same session id picks the credentials back up
  let restored = lumina_client::auth::AuthSession::hydrated("s1", env.db.clone());
  assert_eq!(restored.token().as_deref(), Some("tok-1"));
  assert_eq!(restored.current_user().map(|u| u.id), Some(7));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
  let base = common::dead_origin().await;
  let api = api_for(&base, signed_in("s1", None, "tok"));
  let err: ApiError = api.due_for_review().await.unwrap_err();
  assert!(err.is_network());
}
