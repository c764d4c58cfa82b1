//! Verse records and their identity key.
//!
//! A verse is identified by `(book, chapter, verse)` alone. Two records with
//! the same coordinates are the same verse even when their text differs, so a
//! stale cached copy and a freshly fetched one compare as equal keys.

use std::fmt;

use serde::{Deserialize, Serialize};

// ─── Identity key ────────────────────────────────────────────────────────────

/// Structural identity of a verse.
///
/// Replaces any string-concatenated key scheme: book names may contain
/// spaces, digits or punctuation (`"1 John"`, `"Esther (Greek)"`) without
/// risk of two different verses colliding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VerseKey {
  pub book:    String,
  pub chapter: u32,
  pub verse:   u32,
}

impl VerseKey {
  pub fn new(book: impl Into<String>, chapter: u32, verse: u32) -> Self {
    Self { book: book.into(), chapter, verse }
  }

  /// Whether this verse lives in `book` chapter `chapter`.
  pub fn in_chapter(&self, book: &str, chapter: u32) -> bool {
    self.book == book && self.chapter == chapter
  }
}

impl fmt::Display for VerseKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}:{}", self.book, self.chapter, self.verse)
  }
}

// ─── Verse record ────────────────────────────────────────────────────────────

/// Identity plus content for one verse. Treated as an immutable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRef {
  pub book:    String,
  pub chapter: u32,
  pub verse:   u32,
  pub text:    String,
}

impl VerseRef {
  pub fn new(
    book: impl Into<String>,
    chapter: u32,
    verse: u32,
    text: impl Into<String>,
  ) -> Self {
    Self { book: book.into(), chapter, verse, text: text.into() }
  }

  pub fn key(&self) -> VerseKey {
    VerseKey::new(self.book.clone(), self.chapter, self.verse)
  }

  /// Compare by identity key without allocating.
  pub fn has_key(&self, key: &VerseKey) -> bool {
    self.book == key.book && self.chapter == key.chapter && self.verse == key.verse
  }

  /// Identity comparison; `text` is ignored.
  pub fn same_verse(&self, other: &VerseRef) -> bool {
    self.book == other.book && self.chapter == other.chapter && self.verse == other.verse
  }

  /// `"text" - Book C:V`, the format used when copying or sharing a verse.
  pub fn quote(&self) -> String {
    format!("\"{}\" - {} {}:{}", self.text, self.book, self.chapter, self.verse)
  }
}

impl fmt::Display for VerseRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}:{}", self.book, self.chapter, self.verse)
  }
}

/// Position of the verse with `key` inside `verses`, if present.
pub fn position_of(verses: &[VerseRef], key: &VerseKey) -> Option<usize> {
  verses.iter().position(|v| v.has_key(key))
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  #[test]
  fn identity_ignores_text() {
    let cached = VerseRef::new("John", 3, 16, "For God so loved...");
    let fresh = VerseRef::new("John", 3, 16, "For God so loved the world");
    assert!(cached.same_verse(&fresh));
    assert_eq!(cached.key(), fresh.key());
    assert_ne!(cached, fresh);
  }

  #[test]
  fn keys_with_delimiter_characters_stay_distinct() {
    let keys: HashSet<_> = [
      VerseKey::new("Song_of_Songs", 1, 2),
      VerseKey::new("Song of Songs", 1, 2),
      VerseKey::new("Song_of_Songs", 12, 0),
    ]
    .into_iter()
    .collect();
    assert_eq!(keys.len(), 3);
  }

  #[test]
  fn display_and_quote() {
    let v = VerseRef::new("1 John", 4, 8, "God is love.");
    assert_eq!(v.key().to_string(), "1 John 4:8");
    assert_eq!(v.quote(), "\"God is love.\" - 1 John 4:8");
  }

  #[test]
  fn position_of_finds_by_key() {
    let verses = vec![
      VerseRef::new("Psalms", 23, 1, "The Lord is my shepherd"),
      VerseRef::new("Psalms", 23, 2, "green pastures"),
    ];
    assert_eq!(position_of(&verses, &VerseKey::new("Psalms", 23, 2)), Some(1));
    assert_eq!(position_of(&verses, &VerseKey::new("Psalms", 24, 2)), None);
  }
}
