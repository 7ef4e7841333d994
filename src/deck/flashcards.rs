use crate::domain::VocabularyWord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardMark {
  Easy,
  Difficult,
}

impl CardMark {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "easy" => Some(Self::Easy),
      "difficult" => Some(Self::Difficult),
      _ => None,
    }
  }
}

/// Flip-card walk through a deck. Every card starts out "learning".
#[derive(Debug, Clone)]
pub struct FlashcardSession {
  terms: Vec<VocabularyWord>,
  index: usize,
  flipped: bool,
  easy: usize,
  learning: usize,
  difficult: usize,
}

impl FlashcardSession {
  pub fn new(terms: Vec<VocabularyWord>) -> Self {
    let learning = terms.len();
    Self {
      terms,
      index: 0,
      flipped: false,
      easy: 0,
      learning,
      difficult: 0,
    }
  }

  pub fn current(&self) -> Option<&VocabularyWord> {
    self.terms.get(self.index)
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn len(&self) -> usize {
    self.terms.len()
  }

  pub fn is_empty(&self) -> bool {
    self.terms.is_empty()
  }

  pub fn is_flipped(&self) -> bool {
    self.flipped
  }

  pub fn counts(&self) -> (usize, usize, usize) {
    (self.easy, self.learning, self.difficult)
  }

  /// Percentage of the deck seen so far, current card included
  pub fn progress_percent(&self) -> u32 {
    if self.terms.is_empty() {
      return 0;
    }
    (((self.index + 1) * 100) / self.terms.len()) as u32
  }

  pub fn flip(&mut self) {
    self.flipped = !self.flipped;
  }

  pub fn next(&mut self) -> bool {
    if self.index + 1 < self.terms.len() {
      self.index += 1;
      self.flipped = false;
      true
    } else {
      false
    }
  }

  pub fn previous(&mut self) -> bool {
    if self.index > 0 {
      self.index -= 1;
      self.flipped = false;
      true
    } else {
      false
    }
  }

  pub fn jump_to(&mut self, index: usize) -> bool {
    if index < self.terms.len() {
      self.index = index;
      self.flipped = false;
      true
    } else {
      false
    }
  }

  pub fn mark(&mut self, mark: CardMark) {
    match mark {
      CardMark::Easy => self.mark_easy(),
      CardMark::Difficult => self.mark_difficult(),
    }
  }

  pub fn mark_easy(&mut self) {
    self.easy += 1;
    self.learning = self.learning.saturating_sub(1);
    self.next();
  }

  pub fn mark_difficult(&mut self) {
    self.difficult += 1;
    self.learning = self.learning.saturating_sub(1);
    self.next();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::quiz::generator::tests::ten_words;

  #[test]
  fn test_navigation_resets_flip() {
    let mut s = FlashcardSession::new(ten_words());
    s.flip();
    assert!(s.is_flipped());
    assert!(s.next());
    assert!(!s.is_flipped());
    assert_eq!(s.index(), 1);
    assert!(s.previous());
    assert!(!s.previous());
    assert!(s.jump_to(9));
    assert!(!s.next());
    assert!(!s.jump_to(10));
    assert_eq!(s.progress_percent(), 100);
  }

  #[test]
  fn test_marking_moves_cards_out_of_learning() {
    let mut s = FlashcardSession::new(ten_words());
    assert_eq!(s.counts(), (0, 10, 0));
    s.mark_easy();
    s.mark(CardMark::Difficult);
    assert_eq!(s.counts(), (1, 8, 1));
    assert_eq!(s.index(), 2);
  }

  #[test]
  fn test_learning_never_negative() {
    let mut s = FlashcardSession::new(ten_words().into_iter().take(1).collect());
    s.mark_easy();
    s.mark_easy();
    assert_eq!(s.counts(), (2, 0, 0));
  }

  #[test]
  fn test_empty_deck() {
    let s = FlashcardSession::new(Vec::new());
    assert!(s.is_empty());
    assert!(s.current().is_none());
    assert_eq!(s.progress_percent(), 0);
  }
}
