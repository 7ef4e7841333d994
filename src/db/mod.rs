//! Client-side SQLite storage: persisted session keys and the offline
//! write queue.

pub mod local_storage;
pub mod pending_writes;
pub mod schema;

use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use local_storage::*;
pub use pending_writes::*;
pub use schema::run_migrations;

pub type DbPool = Arc<Mutex<Connection>>;

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
  /// Log the error at warn level and return None
  fn log_warn(self, context: &str) -> Option<T>;
  /// Log the error at warn level and return the default
  fn log_warn_default(self, context: &str) -> T
  where
    T: Default;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
  fn log_warn(self, context: &str) -> Option<T> {
    match self {
      Ok(v) => Some(v),
      Err(e) => {
        tracing::warn!("{}: {}", context, e);
        None
      }
    }
  }

  fn log_warn_default(self, context: &str) -> T
  where
    T: Default,
  {
    match self {
      Ok(v) => v,
      Err(e) => {
        tracing::warn!("{}: {}", context, e);
        T::default()
      }
    }
  }
}

/// Error returned when database lock cannot be acquired
#[derive(Debug, thiserror::Error)]
#[error("Database unavailable")]
pub struct DbLockError;

/// Try to acquire the database lock, returning an error if poisoned
pub fn try_lock(pool: &DbPool) -> std::result::Result<MutexGuard<'_, Connection>, DbLockError> {
  pool.lock().map_err(|_: PoisonError<_>| {
    tracing::error!("Database mutex poisoned - a thread panicked while holding the lock");
    DbLockError
  })
}

/// Errors from storage helpers that also need the lock
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error(transparent)]
  Lock(#[from] DbLockError),
  #[error("sqlite: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("stored value is not valid JSON: {0}")]
  Json(#[from] serde_json::Error),
}

pub fn init_db(path: &Path) -> Result<DbPool> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).ok();
  }

  let conn = Connection::open(path)?;
  run_migrations(&conn)?;
  Ok(Arc::new(Mutex::new(conn)))
}

/// Fresh in-memory store, used by tests and when the data dir is unwritable
pub fn init_memory_db() -> Result<DbPool> {
  let conn = Connection::open_in_memory()?;
  run_migrations(&conn)?;
  Ok(Arc::new(Mutex::new(conn)))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_init_db_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("client.db");
    let pool = init_db(&path).unwrap();
    assert!(path.exists());
    assert!(try_lock(&pool).is_ok());
  }

  #[test]
  fn test_log_warn_default_on_error() {
    let failed: std::result::Result<u32, &str> = Err("boom");
    assert_eq!(failed.log_warn_default("counting"), 0);
    let ok: std::result::Result<u32, &str> = Ok(4);
    assert_eq!(ok.log_warn("counting"), Some(4));
  }
}
