//! The canon: ordered book list, testament grouping and chapter counts.
//!
//! Used to populate book selection, to bound chapter navigation, and as a
//! fallback [`BookCatalog`] when no hosted catalog is reachable.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::{ProviderError, provider::BookCatalog};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Testament {
  #[strum(to_string = "Old Testament")]
  Old,
  #[strum(to_string = "New Testament")]
  New,
  #[strum(to_string = "Apocrypha")]
  Apocrypha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonBook {
  pub name:      &'static str,
  pub testament: Testament,
  pub chapters:  u32,
}

const fn book(name: &'static str, testament: Testament, chapters: u32) -> CanonBook {
  CanonBook { name, testament, chapters }
}

use Testament::{Apocrypha as A, New as N, Old as O};

/// Every book in canonical order.
pub const BOOKS: &[CanonBook] = &[
  book("Genesis", O, 50),
  book("Exodus", O, 40),
  book("Leviticus", O, 27),
  book("Numbers", O, 36),
  book("Deuteronomy", O, 34),
  book("Joshua", O, 24),
  book("Judges", O, 21),
  book("Ruth", O, 4),
  book("1 Samuel", O, 31),
  book("2 Samuel", O, 24),
  book("1 Kings", O, 22),
  book("2 Kings", O, 25),
  book("1 Chronicles", O, 29),
  book("2 Chronicles", O, 36),
  book("Ezra", O, 10),
  book("Nehemiah", O, 13),
  book("Esther", O, 10),
  book("Job", O, 42),
  book("Psalms", O, 150),
  book("Proverbs", O, 31),
  book("Ecclesiastes", O, 12),
  book("Song of Solomon", O, 8),
  book("Isaiah", O, 66),
  book("Jeremiah", O, 52),
  book("Lamentations", O, 5),
  book("Ezekiel", O, 48),
  book("Daniel", O, 12),
  book("Hosea", O, 14),
  book("Joel", O, 3),
  book("Amos", O, 9),
  book("Obadiah", O, 1),
  book("Jonah", O, 4),
  book("Micah", O, 7),
  book("Nahum", O, 3),
  book("Habakkuk", O, 3),
  book("Zephaniah", O, 3),
  book("Haggai", O, 2),
  book("Zechariah", O, 14),
  book("Malachi", O, 4),
  book("Matthew", N, 28),
  book("Mark", N, 16),
  book("Luke", N, 24),
  book("John", N, 21),
  book("Acts", N, 28),
  book("Romans", N, 16),
  book("1 Corinthians", N, 16),
  book("2 Corinthians", N, 13),
  book("Galatians", N, 6),
  book("Ephesians", N, 6),
  book("Philippians", N, 4),
  book("Colossians", N, 4),
  book("1 Thessalonians", N, 5),
  book("2 Thessalonians", N, 3),
  book("1 Timothy", N, 6),
  book("2 Timothy", N, 4),
  book("Titus", N, 3),
  book("Philemon", N, 1),
  book("Hebrews", N, 13),
  book("James", N, 5),
  book("1 Peter", N, 5),
  book("2 Peter", N, 3),
  book("1 John", N, 5),
  book("2 John", N, 1),
  book("3 John", N, 1),
  book("Jude", N, 1),
  book("Revelation", N, 22),
  book("Tobit", A, 14),
  book("Judith", A, 16),
  book("Esther (Greek)", A, 16),
  book("Wisdom of Solomon", A, 19),
  book("Sirach", A, 51),
  book("Baruch", A, 6),
  book("Letter of Jeremiah", A, 1),
  book("Song of the Three Young Men", A, 1),
  book("Susanna", A, 1),
  book("Bel and the Dragon", A, 1),
  book("1 Maccabees", A, 16),
  book("2 Maccabees", A, 15),
  book("1 Esdras", A, 9),
  book("2 Esdras", A, 16),
  book("Prayer of Manasseh", A, 1),
  book("Psalm 151", A, 1),
  book("3 Maccabees", A, 7),
  book("4 Maccabees", A, 18),
];

/// Case-insensitive lookup by book name.
pub fn lookup(name: &str) -> Option<&'static CanonBook> {
  let name = name.trim();
  BOOKS.iter().find(|b| b.name.eq_ignore_ascii_case(name))
}

pub fn chapter_count(name: &str) -> Option<u32> { lookup(name).map(|b| b.chapters) }

/// Zero-based canonical position, used for ordering search results.
pub fn position(name: &str) -> Option<usize> {
  BOOKS.iter().position(|b| b.name.eq_ignore_ascii_case(name.trim()))
}

pub fn books_in(testament: Testament) -> impl Iterator<Item = &'static CanonBook> {
  BOOKS.iter().filter(move |b| b.testament == testament)
}

/// [`BookCatalog`] over the built-in canon. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog;

impl BookCatalog for StaticCatalog {
  async fn list_books(&self) -> Result<Vec<String>, ProviderError> {
    Ok(BOOKS.iter().map(|b| b.name.to_owned()).collect())
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn testament_sizes() {
    assert_eq!(books_in(Testament::Old).count(), 39);
    assert_eq!(books_in(Testament::New).count(), 27);
    assert_eq!(books_in(Testament::Apocrypha).count(), 18);
  }

  #[test]
  fn lookup_is_case_insensitive() {
    assert_eq!(chapter_count("psalms"), Some(150));
    assert_eq!(chapter_count(" 1 John "), Some(5));
    assert_eq!(chapter_count("Hezekiah"), None);
    assert_eq!(lookup("JUDE").map(|b| b.testament), Some(Testament::New));
  }

  #[test]
  fn positions_follow_canon_order() {
    assert!(position("Genesis") < position("Malachi"));
    assert!(position("Malachi") < position("Matthew"));
    assert_eq!(position("Revelation"), Some(65));
  }

  #[test]
  fn testament_labels() {
    let labels: Vec<String> = Testament::iter().map(|t| t.to_string()).collect();
    assert_eq!(labels, ["Old Testament", "New Testament", "Apocrypha"]);
  }

  #[tokio::test]
  async fn static_catalog_lists_every_book() {
    let books = StaticCatalog.list_books().await.unwrap();
    assert_eq!(books.len(), BOOKS.len());
    assert_eq!(books.first().map(String::as_str), Some("Genesis"));
  }
}
