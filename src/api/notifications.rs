use reqwest::Method;

use super::{ApiError, LuminaApi};
use crate::domain::{Notification, UnreadCountResponse};

impl LuminaApi {
  pub async fn my_notifications(&self) -> Result<Vec<Notification>, ApiError> {
    self.get_json("/usernotification/my", &[]).await
  }

  pub async fn unread_count(&self) -> Result<u32, ApiError> {
    let resp: UnreadCountResponse = self.get_json("/usernotification/unread-count", &[]).await?;
    Ok(resp.unread_count)
  }

  pub async fn mark_notification_read(&self, notification_id: i64) -> Result<(), ApiError> {
    self
      .send_empty::<()>(
        Method::PUT,
        &format!("/usernotification/{notification_id}/read"),
        None,
      )
      .await
  }

  pub async fn mark_all_notifications_read(&self) -> Result<(), ApiError> {
    self
      .send_empty::<()>(Method::PUT, "/usernotification/read-all", None)
      .await
  }
}
