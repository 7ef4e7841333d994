pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod deck;
pub mod domain;
pub mod filters;
pub mod handlers;
pub mod notifications;
pub mod paths;
pub mod quiz;
pub mod quota;
pub mod routes;
pub mod session;
pub mod srs;
pub mod state;
pub mod sync;
pub mod timer;
