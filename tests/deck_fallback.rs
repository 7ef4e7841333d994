mod common;

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{api_for, serve, signed_in, word_json};
use lumina_client::api::ApiError;
use lumina_client::deck::{DeckSource, load_deck};

fn backend(public_status: StatusCode, own_status: StatusCode, own_hits: Arc<AtomicUsize>) -> Router {
  Router::new()
    .route(
      "/vocabulary-lists/public/{id}/vocabularies",
      get(move || async move {
        if public_status.is_success() {
          Json(serde_json::json!([word_json(1, 5, "accrue", "to accumulate")])).into_response()
        } else {
          public_status.into_response()
        }
      }),
    )
    .route(
      "/vocabularies",
      get(move || {
        let own_hits = own_hits.clone();
        async move {
          own_hits.fetch_add(1, Ordering::SeqCst);
          if own_status.is_success() {
            Json(serde_json::json!([
              word_json(1, 5, "accrue", "to accumulate"),
              word_json(2, 5, "ledger", "a book of accounts"),
            ]))
            .into_response()
          } else {
            own_status.into_response()
          }
        }
      }),
    )
}

#[tokio::test]
async fn test_public_list_served_first() {
  let own_hits = Arc::new(AtomicUsize::new(0));
  let base = serve(backend(StatusCode::OK, StatusCode::OK, own_hits.clone())).await;
  let api = api_for(&base, signed_in("s1", None, "tok"));

  let (source, words) = load_deck(&api, 5).await.unwrap();
  assert_eq!(source, DeckSource::PublicList);
  assert_eq!(words.len(), 1);
  assert_eq!(own_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_public_list_falls_back_to_own() {
  let own_hits = Arc::new(AtomicUsize::new(0));
  let base = serve(backend(StatusCode::NOT_FOUND, StatusCode::OK, own_hits.clone())).await;
  let api = api_for(&base, signed_in("s1", None, "tok"));

  let (source, words) = load_deck(&api, 5).await.unwrap();
  assert_eq!(source, DeckSource::OwnList);
  assert_eq!(words.iter().map(|w| w.word.as_str()).collect::<Vec<_>>(), ["accrue", "ledger"]);
  assert_eq!(own_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_every_source_refused_returns_last_error() {
  let own_hits = Arc::new(AtomicUsize::new(0));
  let base = serve(backend(StatusCode::NOT_FOUND, StatusCode::FORBIDDEN, own_hits)).await;
  let api = api_for(&base, signed_in("s1", None, "tok"));

  let err = load_deck(&api, 5).await.unwrap_err();
  assert!(matches!(err, ApiError::Forbidden(_)));
}

#[tokio::test]
async fn test_server_error_does_not_fall_through() {
  let own_hits = Arc::new(AtomicUsize::new(0));
  let base = serve(backend(StatusCode::INTERNAL_SERVER_ERROR, StatusCode::OK, own_hits.clone())).await;
  let api = api_for(&base, signed_in("s1", None, "tok"));

  let err = load_deck(&api, 5).await.unwrap_err();
  assert!(matches!(err, ApiError::Server { status: 500, .. }));
  assert_eq!(own_hits.load(Ordering::SeqCst), 0);
}
