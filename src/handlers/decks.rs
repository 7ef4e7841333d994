//! Flashcard viewer for a vocabulary list.

use askama::Template;
use axum::{
  Form,
  extract::{Path, Query},
  response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use super::{NavInfo, NoticeQuery, with_notice};
use crate::auth::SignedIn;
use crate::deck::{self, CardMark, FlashcardSession};
use crate::filters;
use crate::session::{OpenDeck, lock};

#[derive(Template)]
#[template(path = "decks/view.html")]
pub struct DeckTemplate {
  pub nav: NavInfo,
  pub list_id: i64,
  pub source: &'static str,
  pub position: usize,
  pub total: usize,
  pub progress: u32,
  pub flipped: bool,
  pub word: String,
  pub word_type: String,
  pub definition: String,
  pub example: Option<String>,
  pub audio_url: Option<String>,
  pub easy: usize,
  pub learning: usize,
  pub difficult: usize,
  pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "decks/empty.html")]
pub struct DeckEmptyTemplate {
  pub nav: NavInfo,
  pub error: Option<String>,
}

/// GET /decks/{id}
pub async fn deck_view(
  ctx: SignedIn,
  Path(list_id): Path<i64>,
  Query(query): Query<NoticeQuery>,
) -> Response {
  let open = lock(&ctx.session.deck).as_ref().is_some_and(|d| d.list_id == list_id);
  let mut source = "";
  if !open {
    match deck::load_deck(&ctx.session.api, list_id).await {
      Ok((from, words)) => {
        source = from.as_str();
        *lock(&ctx.session.deck) = Some(OpenDeck {
          list_id,
          cards: FlashcardSession::new(words),
        });
      }
      Err(e) => {
        let template = DeckEmptyTemplate {
          nav: NavInfo::new(&ctx),
          error: Some(e.user_message()),
        };
        return Html(template.render().unwrap_or_default()).into_response();
      }
    }
  }

  let template = {
    let deck = lock(&ctx.session.deck);
    let Some(open) = deck.as_ref() else {
      return Redirect::to("/quiz").into_response();
    };
    let cards = &open.cards;
    let Some(card) = cards.current() else {
      let template = DeckEmptyTemplate {
        nav: NavInfo::new(&ctx),
        error: None,
      };
      return Html(template.render().unwrap_or_default()).into_response();
    };
    let (easy, learning, difficult) = cards.counts();
    DeckTemplate {
      nav: NavInfo::new(&ctx),
      list_id,
      source,
      position: cards.index() + 1,
      total: cards.len(),
      progress: cards.progress_percent(),
      flipped: cards.is_flipped(),
      word: card.word.clone(),
      word_type: card.word_type.clone(),
      definition: card.definition.clone(),
      example: card.example.clone(),
      audio_url: card.audio_url.clone(),
      easy,
      learning,
      difficult,
      notice: query.notice,
    }
  };
  Html(template.render().unwrap_or_default()).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct JumpForm {
  #[serde(default)]
  pub index: Option<usize>,
}

/// POST /decks/{id}/{action} - flip, next, previous, easy, difficult or jump
pub async fn deck_action(
  ctx: SignedIn,
  Path((list_id, action)): Path<(i64, String)>,
  Form(form): Form<JumpForm>,
) -> Redirect {
  let back = format!("/decks/{}", list_id);
  let mut deck = lock(&ctx.session.deck);
  let Some(open) = deck.as_mut().filter(|d| d.list_id == list_id) else {
    return Redirect::to(&back);
  };
  let cards = &mut open.cards;
  match action.as_str() {
    "flip" => cards.flip(),
    "next" => {
      if !cards.next() {
        return Redirect::to(&with_notice(&back, "That was the last card."));
      }
    }
    "previous" => {
      cards.previous();
    }
    "jump" => {
      // Positions are 1-based in the form
      let target = form.index.unwrap_or(1).saturating_sub(1);
      if !cards.jump_to(target) {
        return Redirect::to(&with_notice(&back, "No card at that position."));
      }
    }
    other => match CardMark::from_str(other) {
      Some(mark) => cards.mark(mark),
      None => return Redirect::to(&with_notice(&back, "Unknown action.")),
    },
  }
  Redirect::to(&back)
}
