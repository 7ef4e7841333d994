//! Offline write queue. Reviews and quiz results that fail for lack of
//! connectivity are stored locally and replayed later, oldest first.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::api::{ApiError, LuminaApi};
use crate::db::{
  self, DbPool, LogOnError, PendingKind, PendingWrite, StoreError, try_lock,
};
use crate::domain::{QuizResultRequest, ReviewVocabularyRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
  Sent,
  Queued,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
  pub sent: usize,
  pub dropped: usize,
  pub remaining: usize,
}

/// Send a stored payload to the backend
async fn deliver(api: &LuminaApi, kind: PendingKind, payload: &str) -> Result<(), ApiError> {
  let decode_err = |e: serde_json::Error| ApiError::Decode(e.to_string());
  match kind {
    PendingKind::Review => {
      let request: ReviewVocabularyRequest = serde_json::from_str(payload).map_err(decode_err)?;
      api.review_vocabulary(&request).await.map(|_| ())
    }
    PendingKind::QuizResult => {
      let request: QuizResultRequest = serde_json::from_str(payload).map_err(decode_err)?;
      api.save_quiz_result(&request).await
    }
  }
}

/// Writes that should wait for a later flush rather than be dropped
fn keeps_entry(error: &ApiError) -> bool {
  error.is_network() || error.is_auth()
}

/// Try the write now; queue it when the backend is unreachable
pub async fn submit_or_queue<T: Serialize>(
  db: &DbPool,
  api: &LuminaApi,
  kind: PendingKind,
  payload: &T,
) -> Result<Delivery, ApiError> {
  let json = serde_json::to_string(payload).map_err(|e| ApiError::Decode(e.to_string()))?;
  match deliver(api, kind, &json).await {
    Ok(()) => Ok(Delivery::Sent),
    Err(e) if e.is_network() => {
      let session_id = api.auth().session_id().to_string();
      let Some(user) = api.auth().current_user() else {
        return Err(e);
      };
      let conn = try_lock(db).map_err(|_| e.clone())?;
      match db::enqueue_write(&conn, &session_id, user.id, kind, &json) {
        Ok(id) => {
          tracing::info!("Backend unreachable, queued {} write {} for later", kind.as_str(), id);
          Ok(Delivery::Queued)
        }
        Err(store) => {
          tracing::error!("Failed to queue {} write: {}", kind.as_str(), store);
          Err(e)
        }
      }
    }
    Err(e) => Err(e),
  }
}

pub async fn submit_review(
  db: &DbPool,
  api: &LuminaApi,
  request: &ReviewVocabularyRequest,
) -> Result<Delivery, ApiError> {
  submit_or_queue(db, api, PendingKind::Review, request).await
}

pub async fn submit_quiz_result(
  db: &DbPool,
  api: &LuminaApi,
  request: &QuizResultRequest,
) -> Result<Delivery, ApiError> {
  submit_or_queue(db, api, PendingKind::QuizResult, request).await
}

/// Replay the signed-in user's queue in order. Stops at the first network
/// failure. Writes queued by anyone else in the same browser stay put.
pub async fn flush(db: &DbPool, api: &LuminaApi) -> Result<FlushReport, StoreError> {
  let Some(user) = api.auth().current_user() else {
    return Ok(FlushReport::default());
  };
  let session_id = api.auth().session_id().to_string();
  let pending: Vec<PendingWrite> = {
    let conn = try_lock(db)?;
    db::pending_for_user(&conn, &session_id, user.id)?
  };

  let mut report = FlushReport::default();
  for (position, write) in pending.iter().enumerate() {
    let Some(kind) = write.kind else {
      tracing::warn!("Dropping queued write {} with unknown kind", write.id);
      let conn = try_lock(db)?;
      db::delete_write(&conn, write.id)?;
      report.dropped += 1;
      continue;
    };

    let result = deliver(api, kind, &write.payload).await;
    let conn = try_lock(db)?;
    match result {
      Ok(()) => {
        db::delete_write(&conn, write.id)?;
        report.sent += 1;
      }
      Err(e) if keeps_entry(&e) => {
        db::record_attempt(&conn, write.id, &e.to_string())?;
        report.remaining = pending.len() - position;
        tracing::debug!(
          "Flush for session stopped after {} sent, {} still queued: {}",
          report.sent,
          report.remaining,
          e
        );
        return Ok(report);
      }
      Err(e) => {
        tracing::warn!("Dropping queued {} write {}: {}", kind.as_str(), write.id, e);
        db::delete_write(&conn, write.id)?;
        report.dropped += 1;
      }
    }
  }

  if report.sent > 0 {
    tracing::info!("Replayed {} queued write(s)", report.sent);
  }
  Ok(report)
}

/// Looks up the API client for a session id, if the session is still live
pub type ApiResolver = Arc<dyn Fn(&str) -> Option<LuminaApi> + Send + Sync>;

/// Flush every session that has queued writes
pub async fn flush_all(db: &DbPool, resolve: &ApiResolver) {
  let sessions = match try_lock(db) {
    Ok(conn) => db::sessions_with_pending(&conn).log_warn_default("Failed to list queued sessions"),
    Err(_) => return,
  };
  for session_id in sessions {
    let Some(api) = resolve(&session_id) else { continue };
    if !api.auth().is_signed_in() {
      continue;
    }
    flush(db, &api).await.log_warn("Offline queue flush failed");
  }
}

pub fn spawn_sync_worker(db: DbPool, every: Duration, resolve: ApiResolver) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
      interval.tick().await;
      flush_all(&db, &resolve).await;
    }
  })
}
