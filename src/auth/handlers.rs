//! Login and logout against the Lumina backend.

use askama::Template;
use axum::{
  Form,
  extract::State,
  response::{Html, IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;

use super::middleware::{SESSION_COOKIE_NAME, is_valid_session_id};
use crate::api::ApiError;
use crate::config::SESSION_EXPIRY_HOURS;
use crate::filters;
use crate::session::generate_session_id;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
  pub error: Option<String>,
  pub username: String,
  pub version: &'static str,
}

impl LoginTemplate {
  fn new(error: Option<String>, username: String) -> Self {
    Self {
      error,
      username,
      version: env!("CARGO_PKG_VERSION"),
    }
  }
}

#[derive(Deserialize)]
pub struct LoginForm {
  pub username: String,
  pub password: String,
}

/// GET /login - Show login page
pub async fn login_page() -> Html<String> {
  let template = LoginTemplate::new(None, String::new());
  Html(template.render().unwrap_or_default())
}

/// POST /login - Sign in with the backend
pub async fn login_submit(
  State(state): State<AppState>,
  jar: CookieJar,
  Form(form): Form<LoginForm>,
) -> impl IntoResponse {
  let username = form.username.trim().to_string();
  if username.is_empty() || form.password.is_empty() {
    let template = LoginTemplate::new(Some("Username and password are required".to_string()), username);
    return (jar, Html(template.render().unwrap_or_default())).into_response();
  }

  // Keep the browser's session so queued offline writes stay attached to it
  let session_id = jar
    .get(SESSION_COOKIE_NAME)
    .map(|c| c.value().to_string())
    .filter(|id| is_valid_session_id(id))
    .unwrap_or_else(generate_session_id);
  let session = state.sessions.get_or_create(&session_id);

  match session.api.login(&username, &form.password).await {
    Ok(login) => {
      tracing::info!("User {} signed in", login.user.username);
      session.adopt_user(login.user.id);
      session.start_notifications(state.stream_http.clone(), &state.config);
    }
    Err(e) => {
      tracing::info!("Login failed for {}: {}", username, e);
      let message = match e {
        ApiError::Unauthorized | ApiError::Status { status: 400, .. } => {
          "Invalid username or password".to_string()
        }
        other => other.user_message(),
      };
      let template = LoginTemplate::new(Some(message), username);
      return (jar, Html(template.render().unwrap_or_default())).into_response();
    }
  }

  let session_cookie = Cookie::build((SESSION_COOKIE_NAME, session_id))
    .path("/")
    .http_only(true)
    .secure(false) // Set to true in production with HTTPS
    .max_age(time::Duration::hours(SESSION_EXPIRY_HOURS))
    .build();

  (jar.add(session_cookie), Redirect::to("/")).into_response()
}

/// POST /logout - Forget the user and stop their background tasks
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
  if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
    if let Some(session) = state.sessions.get(cookie.value()) {
      if let Some(user) = session.auth.current_user() {
        tracing::info!("User {} signed out", user.username);
      }
      session.sign_out();
    }
  }
  (jar, Redirect::to("/login"))
}
