//! Route table for the web client.

use axum::{Router, routing::get, routing::post};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::{auth, handlers};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
  Router::new()
    .route("/health", get(handlers::health))
    .route("/login", get(auth::login_page).post(auth::login_submit))
    .route("/logout", post(auth::logout))
    .route("/", get(handlers::index))
    .route("/quiz", get(handlers::quiz_picker))
    .route("/quiz/start", post(handlers::quiz_start))
    .route("/quiz/play", get(handlers::quiz_play))
    .route("/quiz/select", post(handlers::quiz_select))
    .route("/quiz/submit", post(handlers::quiz_submit))
    .route("/quiz/next", post(handlers::quiz_next))
    .route("/quiz/previous", post(handlers::quiz_previous))
    .route("/quiz/finish", post(handlers::quiz_finish))
    .route("/quiz/results", get(handlers::quiz_results))
    .route("/review", get(handlers::review_page))
    .route("/review/answer", post(handlers::review_answer))
    .route("/srs", get(handlers::srs_dashboard))
    .route("/srs/words", get(handlers::srs_words))
    .route("/decks/{id}", get(handlers::deck_view))
    .route("/decks/{id}/{action}", post(handlers::deck_action))
    .route("/notifications", get(handlers::notifications_page))
    .route("/notifications/unread-count", get(handlers::unread_count))
    .route("/notifications/read-all", post(handlers::mark_all_read))
    .route("/notifications/{id}/read", post(handlers::mark_read))
    .route("/speaking", get(handlers::speaking_page))
    .route("/speaking/visibility", post(handlers::speaking_visibility))
    .route("/speaking/status", get(handlers::speaking_status))
    .route("/speaking/{phase}/start", post(handlers::speaking_start))
    .nest_service("/static", ServeDir::new("static"))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
