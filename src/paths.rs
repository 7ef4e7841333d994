//! Project path functions - single source of truth for all file paths.
//!
//! ## Environment Variables
//!
//! - `DATA_DIR`: Override the base data directory (default: "data")
//! - `PORT`: Override the server port (see config.rs)
//!
//! This allows running multiple isolated client instances side by side:
//! ```bash
//! DATA_DIR=data/test/a PORT=3001 cargo run
//! ```

use std::env;
use std::sync::OnceLock;

/// Lazily initialized data directory from DATA_DIR env var
static DATA_DIR_VALUE: OnceLock<String> = OnceLock::new();

/// Get the base data directory (from DATA_DIR env var or default "data")
pub fn data_dir() -> &'static str {
  DATA_DIR_VALUE.get_or_init(|| env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()))
}

/// Client-side storage (persisted session keys and the offline write queue)
pub fn client_db_path() -> String {
  format!("{}/client.db", data_dir())
}

#[cfg(test)]
mod tests {
  use super::*;

  // OnceLock initializes once, so only the default shape is checked here.
  #[test]
  fn test_client_db_under_data_dir() {
    let path = client_db_path();
    assert!(path.starts_with(data_dir()));
    assert!(path.ends_with("client.db"));
  }
}
