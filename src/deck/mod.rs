//! Deck loading and the flashcard viewer.

pub mod flashcards;

pub use flashcards::{CardMark, FlashcardSession};

use futures_util::future::BoxFuture;

use crate::api::{ApiError, LuminaApi};
use crate::domain::VocabularyWord;

/// Where a deck's words can come from, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckSource {
  PublicList,
  OwnList,
}

impl DeckSource {
  pub const CHAIN: [DeckSource; 2] = [DeckSource::PublicList, DeckSource::OwnList];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::PublicList => "public list",
      Self::OwnList => "own list",
    }
  }
}

/// Errors that move on to the next source instead of stopping the chain
pub fn falls_through(error: &ApiError) -> bool {
  matches!(error, ApiError::NotFound(_) | ApiError::Forbidden(_))
}

/// Try each source in order until one succeeds.
///
/// NotFound/Forbidden fall through; anything else is returned immediately.
/// When every source falls through, the last error is returned.
pub async fn load_with_fallback<'a, T, F>(
  sources: &[DeckSource],
  mut fetch: F,
) -> Result<(DeckSource, T), ApiError>
where
  F: FnMut(DeckSource) -> BoxFuture<'a, Result<T, ApiError>>,
{
  let mut last_error = ApiError::NotFound("no source available".to_string());
  for &source in sources {
    tracing::debug!("Loading deck from {}", source.as_str());
    match fetch(source).await {
      Ok(value) => return Ok((source, value)),
      Err(e) if falls_through(&e) => {
        tracing::debug!("Deck source {} unavailable: {}", source.as_str(), e);
        last_error = e;
      }
      Err(e) => {
        tracing::warn!("Deck source {} failed: {}", source.as_str(), e);
        return Err(e);
      }
    }
  }
  Err(last_error)
}

/// Words of a vocabulary list, public copy first, then the user's own
pub async fn load_deck(api: &LuminaApi, list_id: i64) -> Result<(DeckSource, Vec<VocabularyWord>), ApiError> {
  load_with_fallback(&DeckSource::CHAIN, |source| {
    let api = api.clone();
    Box::pin(async move {
      match source {
        DeckSource::PublicList => api.public_list_words(list_id).await,
        DeckSource::OwnList => api.list_words(list_id).await,
      }
    })
  })
  .await
}
