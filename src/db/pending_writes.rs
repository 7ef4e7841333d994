//! Offline queue of backend writes that failed for lack of connectivity.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result, params};

/// What a queued write should be replayed as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
  Review,
  QuizResult,
}

impl PendingKind {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "review" => Some(Self::Review),
      "quiz_result" => Some(Self::QuizResult),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Review => "review",
      Self::QuizResult => "quiz_result",
    }
  }
}

#[derive(Debug, Clone)]
pub struct PendingWrite {
  pub id: i64,
  pub session_id: String,
  pub user_id: Option<i64>,
  pub kind: Option<PendingKind>,
  pub payload: String,
  pub created_at: DateTime<Utc>,
  pub attempts: i64,
}

pub fn enqueue_write(
  conn: &Connection,
  session_id: &str,
  user_id: i64,
  kind: PendingKind,
  payload: &str,
) -> Result<i64> {
  conn.execute(
    "INSERT INTO pending_writes (session_id, user_id, kind, payload, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    params![session_id, user_id, kind.as_str(), payload, Utc::now().to_rfc3339()],
  )?;
  Ok(conn.last_insert_rowid())
}

/// Writes a user queued in a session, oldest first
pub fn pending_for_user(conn: &Connection, session_id: &str, user_id: i64) -> Result<Vec<PendingWrite>> {
  let mut stmt = conn.prepare(
    r#"
    SELECT id, session_id, user_id, kind, payload, created_at, attempts
    FROM pending_writes WHERE session_id = ?1 AND user_id = ?2 ORDER BY id ASC
    "#,
  )?;
  let rows = stmt.query_map(params![session_id, user_id], |row| {
    let kind: String = row.get(3)?;
    let created_at: String = row.get(5)?;
    Ok(PendingWrite {
      id: row.get(0)?,
      session_id: row.get(1)?,
      user_id: row.get(2)?,
      kind: PendingKind::from_str(&kind),
      payload: row.get(4)?,
      created_at: DateTime::parse_from_rfc3339(&created_at)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now()),
      attempts: row.get(6)?,
    })
  })?;
  rows.collect()
}

pub fn pending_count(conn: &Connection, session_id: &str, user_id: i64) -> Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM pending_writes WHERE session_id = ?1 AND user_id = ?2",
    params![session_id, user_id],
    |row| row.get(0),
  )
}

/// Sessions that still have something to flush
pub fn sessions_with_pending(conn: &Connection) -> Result<Vec<String>> {
  let mut stmt = conn.prepare("SELECT DISTINCT session_id FROM pending_writes ORDER BY session_id")?;
  let rows = stmt.query_map([], |row| row.get(0))?;
  rows.collect()
}

pub fn delete_write(conn: &Connection, id: i64) -> Result<()> {
  conn.execute("DELETE FROM pending_writes WHERE id = ?1", params![id])?;
  Ok(())
}

pub fn record_attempt(conn: &Connection, id: i64, error: &str) -> Result<()> {
  conn.execute(
    "UPDATE pending_writes SET attempts = attempts + 1, last_error = ?2 WHERE id = ?1",
    params![id, error],
  )?;
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
  fn test_queue_is_fifo_per_session() {
    let conn = setup();
    enqueue_write(&conn, "s1", 7, PendingKind::Review, r#"{"quality":3}"#).unwrap();
    enqueue_write(&conn, "s2", 7, PendingKind::QuizResult, "{}").unwrap();
    enqueue_write(&conn, "s1", 7, PendingKind::QuizResult, r#"{"score":80}"#).unwrap();

    let queued = pending_for_user(&conn, "s1", 7).unwrap();
    assert_eq!(queued.len(), 2);
    assert_eq!(queued[0].kind, Some(PendingKind::Review));
    assert_eq!(queued[1].kind, Some(PendingKind::QuizResult));
    assert_eq!(queued[0].user_id, Some(7));
    assert_eq!(sessions_with_pending(&conn).unwrap(), vec!["s1", "s2"]);
  }

  #[test]
  fn test_queue_is_scoped_to_user() {
    let conn = setup();
    enqueue_write(&conn, "s1", 7, PendingKind::Review, "{}").unwrap();
    enqueue_write(&conn, "s1", 99, PendingKind::QuizResult, "{}").unwrap();

    let queued = pending_for_user(&conn, "s1", 99).unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].kind, Some(PendingKind::QuizResult));
    assert_eq!(pending_count(&conn, "s1", 7).unwrap(), 1);
    assert_eq!(pending_count(&conn, "s1", 42).unwrap(), 0);
  }

  #[test]
  fn test_attempts_and_delete() {
    let conn = setup();
    let id = enqueue_write(&conn, "s1", 7, PendingKind::Review, "{}").unwrap();
    record_attempt(&conn, id, "offline").unwrap();
    record_attempt(&conn, id, "offline").unwrap();
    assert_eq!(pending_for_user(&conn, "s1", 7).unwrap()[0].attempts, 2);

    delete_write(&conn, id).unwrap();
    assert_eq!(pending_count(&conn, "s1", 7).unwrap(), 0);
  }

  #[test]
  fn test_unknown_kind_is_none() {
    let conn = setup();
    conn
      .execute(
        "INSERT INTO pending_writes (session_id, user_id, kind, payload, created_at) VALUES ('s', 7, 'legacy', '{}', 'bad')",
        [],
      )
      .unwrap();
    let queued = pending_for_user(&conn, "s", 7).unwrap();
    assert_eq!(queued[0].kind, None);
  }
}
