//! In-memory verse provider.
//!
//! Stands in for a real content backend in offline mode and in tests. It
//! holds whatever verses it is given; [`MemoryProvider::seeded`] loads a
//! small sample of well-known passages.

use std::sync::Arc;

use crate::{
  ProviderError, canon,
  provider::{BookCatalog, VerseProvider},
  verse::VerseRef,
};

/// Cheap to clone — the verse list is shared.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
  verses: Arc<Vec<VerseRef>>,
}

impl MemoryProvider {
  /// Build a provider over `verses`, sorted by canon position, chapter and
  /// verse. Books outside the canon sort last, by name.
  pub fn new(verses: impl IntoIterator<Item = VerseRef>) -> Self {
    let mut verses: Vec<VerseRef> = verses.into_iter().collect();
    verses.sort_by(|a, b| {
      let pa = canon::position(&a.book).unwrap_or(usize::MAX);
      let pb = canon::position(&b.book).unwrap_or(usize::MAX);
      (pa, &a.book, a.chapter, a.verse).cmp(&(pb, &b.book, b.chapter, b.verse))
    });
    verses.dedup_by(|a, b| a.same_verse(b));
    Self { verses: Arc::new(verses) }
  }

  /// A provider preloaded with Genesis 1, Psalms 23, John 3 and a handful of
  /// single verses.
  pub fn seeded() -> Self { Self::new(seed()) }

  pub fn len(&self) -> usize { self.verses.len() }

  pub fn is_empty(&self) -> bool { self.verses.is_empty() }
}

impl VerseProvider for MemoryProvider {
  async fn fetch_chapter(
    &self,
    book: &str,
    chapter: u32,
  ) -> Result<Vec<VerseRef>, ProviderError> {
    Ok(
      self
        .verses
        .iter()
        .filter(|v| v.book.eq_ignore_ascii_case(book) && v.chapter == chapter)
        .cloned()
        .collect(),
    )
  }

  /// Case-insensitive substring match over verse text and book name.
  async fn search(&self, query: &str) -> Result<Vec<VerseRef>, ProviderError> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
      return Ok(Vec::new());
    }
    Ok(
      self
        .verses
        .iter()
        .filter(|v| {
          v.text.to_lowercase().contains(&needle) || v.book.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect(),
    )
  }
}

impl BookCatalog for MemoryProvider {
  /// Books that have at least one verse, in canon order.
  async fn list_books(&self) -> Result<Vec<String>, ProviderError> {
    let mut books: Vec<String> = Vec::new();
    for verse in self.verses.iter() {
      if books.last() != Some(&verse.book) {
        books.push(verse.book.clone());
      }
    }
    Ok(books)
  }
}

fn seed() -> Vec<VerseRef> {
  const VERSES: &[(&str, u32, u32, &str)] = &[
    ("Genesis", 1, 1, "In the beginning God created the heavens and the earth."),
    ("Genesis", 1, 2, "Now the earth was formless and empty, darkness was over the surface of the deep, and the Spirit of God was hovering over the waters."),
    ("Genesis", 1, 3, "And God said, 'Let there be light,' and there was light."),
    ("Genesis", 1, 4, "God saw that the light was good, and he separated the light from the darkness."),
    ("Genesis", 1, 5, "God called the light 'day,' and the darkness he called 'night.' And there was evening, and there was morning, the first day."),
    ("Psalms", 23, 1, "The Lord is my shepherd, I lack nothing."),
    ("Psalms", 23, 2, "He makes me lie down in green pastures, he leads me beside quiet waters,"),
    ("Psalms", 23, 3, "he refreshes my soul. He guides me along the right paths for his name's sake."),
    ("Psalms", 23, 4, "Even though I walk through the darkest valley, I will fear no evil, for you are with me; your rod and your staff, they comfort me."),
    ("Psalms", 23, 5, "You prepare a table before me in the presence of my enemies. You anoint my head with oil; my cup overflows."),
    ("Psalms", 23, 6, "Surely your goodness and love will follow me all the days of my life, and I will dwell in the house of the Lord forever."),
    ("Matthew", 5, 14, "You are the light of the world. A town built on a hill cannot be hidden."),
    ("John", 3, 14, "Just as Moses lifted up the snake in the wilderness, so the Son of Man must be lifted up,"),
    ("John", 3, 15, "that everyone who believes may have eternal life in him."),
    ("John", 3, 16, "For God so loved the world that he gave his one and only Son, that whoever believes in him shall not perish but have eternal life."),
    ("John", 3, 17, "For God did not send his Son into the world to condemn the world, but to save the world through him."),
    ("John", 3, 18, "Whoever believes in him is not condemned, but whoever does not believe stands condemned already because they have not believed in the name of God's one and only Son."),
    ("Romans", 8, 28, "And we know that in all things God works for the good of those who love him, who have been called according to his purpose."),
    ("Philippians", 4, 13, "I can do all this through him who gives me strength."),
    ("Tobit", 4, 15, "Do to no one what you yourself dislike."),
    ("Wisdom of Solomon", 3, 1, "But the souls of the righteous are in the hand of God, and no torment will ever touch them."),
  ];
  VERSES
    .iter()
    .map(|&(book, chapter, verse, text)| VerseRef::new(book, chapter, verse, text))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn fetch_chapter_returns_verses_in_order() {
    let provider = MemoryProvider::seeded();
    let verses = provider.fetch_chapter("John", 3).await.unwrap();
    let numbers: Vec<u32> = verses.iter().map(|v| v.verse).collect();
    assert_eq!(numbers, [14, 15, 16, 17, 18]);
  }

  #[tokio::test]
  async fn unknown_chapter_is_empty_success() {
    let provider = MemoryProvider::seeded();
    assert!(provider.fetch_chapter("John", 4).await.unwrap().is_empty());
    assert!(provider.fetch_chapter("Hezekiah", 1).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn search_matches_text_and_book() {
    let provider = MemoryProvider::seeded();

    let light = provider.search("LIGHT").await.unwrap();
    assert!(light.iter().any(|v| v.book == "Matthew"));
    assert!(light.iter().all(|v| v.text.to_lowercase().contains("light")));

    let tobit = provider.search("tobit").await.unwrap();
    assert_eq!(tobit.len(), 1);

    assert!(provider.search("   ").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn books_follow_canon_order() {
    let provider = MemoryProvider::new([
      VerseRef::new("John", 1, 1, "In the beginning was the Word"),
      VerseRef::new("Genesis", 1, 1, "In the beginning"),
      VerseRef::new("John", 1, 2, "He was with God"),
    ]);
    let books = provider.list_books().await.unwrap();
    assert_eq!(books, ["Genesis", "John"]);
  }

  #[test]
  fn new_drops_duplicate_keys() {
    let provider = MemoryProvider::new([
      VerseRef::new("John", 3, 16, "a"),
      VerseRef::new("John", 3, 16, "b"),
    ]);
    assert_eq!(provider.len(), 1);
  }
}
