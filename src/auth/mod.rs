//! Sign-in state: the per-session credential store, the extractors that
//! read it, and the login/logout pages.

pub mod handlers;
pub mod middleware;
pub mod store;

pub use handlers::*;
pub use middleware::{OptionalSession, SESSION_COOKIE_NAME, SignedIn};
pub use store::{AuthSession, fingerprint};
