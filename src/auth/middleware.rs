//! Session extractors.

use axum::{
  extract::FromRequestParts,
  http::request::Parts,
  response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use crate::domain::AuthUser;
use crate::session::ClientSession;
use crate::state::AppState;

pub const SESSION_COOKIE_NAME: &str = "lumina_session";

/// Session ids are 32 lowercase alphanumerics
pub fn is_valid_session_id(id: &str) -> bool {
  id.len() == 32 && id.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

/// The browser's client session, if its cookie names one
pub struct OptionalSession(pub Option<Arc<ClientSession>>);

impl FromRequestParts<AppState> for OptionalSession {
  type Rejection = std::convert::Infallible;

  async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
    let jar = CookieJar::from_headers(&parts.headers);
    let session = jar
      .get(SESSION_COOKIE_NAME)
      .map(|c| c.value().to_string())
      .filter(|id| is_valid_session_id(id))
      .map(|id| state.sessions.get_or_create(&id));
    Ok(OptionalSession(session))
  }
}

/// Signed-in request context.
/// Add this as a handler parameter to require a logged-in user.
/// Redirects to /login otherwise.
#[derive(Clone)]
pub struct SignedIn {
  pub session: Arc<ClientSession>,
  pub user: AuthUser,
}

impl FromRequestParts<AppState> for SignedIn {
  type Rejection = Response;

  async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
    let OptionalSession(session) = OptionalSession::from_request_parts(parts, state)
      .await
      .map_err(|never| match never {})?;
    let session = session.ok_or_else(|| Redirect::to("/login").into_response())?;
    let user = session
      .auth
      .current_user()
      .ok_or_else(|| Redirect::to("/login").into_response())?;

    // Sessions hydrated after a restart reconnect here
    session.start_notifications(state.stream_http.clone(), &state.config);

    Ok(SignedIn { session, user })
  }
}
