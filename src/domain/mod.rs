//! Typed records exchanged with the Lumina backend.
//!
//! Every endpoint the client calls has an explicit type here; JSON never
//! crosses the network boundary as an untyped value.

pub mod notification;
pub mod page;
pub mod quota;
pub mod repetition;
pub mod user;
pub mod vocabulary;

pub use notification::{Notification, RealtimeNotification, UnreadCountResponse};
pub use page::{Paged, paginate};
pub use quota::{QuotaCheckResponse, SubscriptionStatus, SubscriptionType};
pub use repetition::{
  RepetitionRecord, RepetitionStatus, ReviewVocabularyRequest, ReviewVocabularyResponse,
};
pub use user::{AuthUser, LoginRequest, LoginResponse, RefreshRequest, Role};
pub use vocabulary::{
  ApprovalStatus, QuizResultRequest, QuizScore, VocabularyList, VocabularyWord, merge_scores,
};

/// Timestamps from the backend arrive either with an offset or as naive
/// local strings that are actually UTC.
pub mod lenient_datetime {
  use chrono::{DateTime, NaiveDateTime, Utc};
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
      return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
      .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
      .ok()
      .map(|naive| naive.and_utc())
  }

  pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&dt.to_rfc3339())
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(d)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
  }

  pub mod option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
      match dt {
        Some(dt) => s.serialize_some(&dt.to_rfc3339()),
        None => s.serialize_none(),
      }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
      d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
      let raw = Option::<String>::deserialize(d)?;
      match raw {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => super::parse(&s)
          .map(Some)
          .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}"))),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::lenient_datetime::parse;
  use chrono::{TimeZone, Utc};

  #[test]
  fn test_parse_offset_timestamp() {
    let dt = parse("2024-03-10T09:30:00+02:00").unwrap();
    assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 0).unwrap());
  }

  #[test]
  fn test_parse_naive_timestamp_as_utc() {
    let dt = parse("2024-03-10T09:30:00.123").unwrap();
    assert_eq!(dt.format("%H:%M:%S").to_string(), "09:30:00");
  }

  #[test]
  fn test_parse_rejects_garbage() {
    assert!(parse("yesterday").is_none());
  }
}
