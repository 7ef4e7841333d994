//! Per-session key/value storage, the server-side stand-in for browser
//! local storage.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Result, params};
use serde::{Serialize, de::DeserializeOwned};

use super::StoreError;

pub fn get_value(conn: &Connection, session_id: &str, key: &str) -> Result<Option<String>> {
  conn
    .query_row(
      "SELECT value FROM local_storage WHERE session_id = ?1 AND key = ?2",
      params![session_id, key],
      |row| row.get(0),
    )
    .optional()
}

pub fn set_value(conn: &Connection, session_id: &str, key: &str, value: &str) -> Result<()> {
  conn.execute(
    r#"
    INSERT INTO local_storage (session_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(session_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
    "#,
    params![session_id, key, value, Utc::now().to_rfc3339()],
  )?;
  Ok(())
}

pub fn remove_value(conn: &Connection, session_id: &str, key: &str) -> Result<()> {
  conn.execute(
    "DELETE FROM local_storage WHERE session_id = ?1 AND key = ?2",
    params![session_id, key],
  )?;
  Ok(())
}

/// Drop every key stored for a session
pub fn clear_session(conn: &Connection, session_id: &str) -> Result<usize> {
  conn.execute(
    "DELETE FROM local_storage WHERE session_id = ?1",
    params![session_id],
  )
}

pub fn get_json<T: DeserializeOwned>(
  conn: &Connection,
  session_id: &str,
  key: &str,
) -> std::result::Result<Option<T>, StoreError> {
  match get_value(conn, session_id, key)? {
    Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
    None => Ok(None),
  }
}

pub fn set_json<T: Serialize>(
  conn: &Connection,
  session_id: &str,
  key: &str,
  value: &T,
) -> std::result::Result<(), StoreError> {
  set_value(conn, session_id, key, &serde_json::to_string(value)?)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::run_migrations;

  fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    conn
  }

  #[test]
  fn test_set_get_overwrite() {
    let conn = setup();
    set_value(&conn, "s1", "lumina_token", "a").unwrap();
    set_value(&conn, "s1", "lumina_token", "b").unwrap();
    assert_eq!(get_value(&conn, "s1", "lumina_token").unwrap().as_deref(), Some("b"));
    assert_eq!(get_value(&conn, "s2", "lumina_token").unwrap(), None);
  }

  #[test]
  fn test_clear_session_only_touches_one_session() {
    let conn = setup();
    set_value(&conn, "s1", "k1", "v").unwrap();
    set_value(&conn, "s1", "k2", "v").unwrap();
    set_value(&conn, "s2", "k1", "v").unwrap();

    assert_eq!(clear_session(&conn, "s1").unwrap(), 2);
    assert_eq!(get_value(&conn, "s2", "k1").unwrap().as_deref(), Some("v"));
  }

  #[test]
  fn test_json_helpers() {
    let conn = setup();
    set_json(&conn, "s1", "ids", &vec![1, 2, 3]).unwrap();
    let ids: Option<Vec<i32>> = get_json(&conn, "s1", "ids").unwrap();
    assert_eq!(ids, Some(vec![1, 2, 3]));

    set_value(&conn, "s1", "broken", "{").unwrap();
    assert!(get_json::<Vec<i32>>(&conn, "s1", "broken").is_err());

    remove_value(&conn, "s1", "ids").unwrap();
    assert_eq!(get_json::<Vec<i32>>(&conn, "s1", "ids").unwrap(), None);
  }
}
