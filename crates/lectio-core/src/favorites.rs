//! The favorite set: identity keys plus their materialized verse records.

use std::collections::HashSet;

use crate::verse::{VerseKey, VerseRef, position_of};

/// A set of favorite verse keys and the ordered list of verses they name.
///
/// The list is kept in sync with the set on every mutation: each key has
/// exactly one entry in `verses`, and `verses` never holds two records with
/// the same identity key.
#[derive(Debug, Clone, Default)]
pub struct FavoriteSet {
  keys:   HashSet<VerseKey>,
  verses: Vec<VerseRef>,
}

impl FavoriteSet {
  pub fn new() -> Self { Self::default() }

  /// Rebuild a set from previously saved verses, dropping duplicate keys.
  /// The first occurrence of a key wins.
  pub fn from_verses(verses: impl IntoIterator<Item = VerseRef>) -> Self {
    let mut set = Self::new();
    for verse in verses {
      if set.keys.insert(verse.key()) {
        set.verses.push(verse);
      }
    }
    set
  }

  /// Add `verse` if its key is absent, otherwise remove the stored entry
  /// with the same key. The stored copy may carry different text.
  pub fn toggle(&mut self, verse: VerseRef) {
    let key = verse.key();
    if self.keys.remove(&key) {
      if let Some(index) = position_of(&self.verses, &key) {
        self.verses.remove(index);
      }
    } else {
      self.keys.insert(key);
      self.verses.push(verse);
    }
  }

  pub fn contains(&self, key: &VerseKey) -> bool { self.keys.contains(key) }

  /// Stored record for `key`, if it is a favorite.
  pub fn get(&self, key: &VerseKey) -> Option<&VerseRef> {
    position_of(&self.verses, key).map(|i| &self.verses[i])
  }

  pub fn keys(&self) -> &HashSet<VerseKey> { &self.keys }

  /// Favorites in the order they were added.
  pub fn verses(&self) -> &[VerseRef] { &self.verses }

  pub fn len(&self) -> usize { self.keys.len() }

  pub fn is_empty(&self) -> bool { self.keys.is_empty() }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn john_3_16() -> VerseRef {
    VerseRef::new("John", 3, 16, "For God so loved...")
  }

  #[test]
  fn toggle_adds_then_removes() {
    let mut favs = FavoriteSet::new();
    favs.toggle(john_3_16());
    assert_eq!(favs.len(), 1);
    assert!(favs.contains(&VerseKey::new("John", 3, 16)));
    assert_eq!(favs.verses(), &[john_3_16()]);

    favs.toggle(john_3_16());
    assert!(favs.is_empty());
    assert!(favs.verses().is_empty());
  }

  #[test]
  fn toggle_with_different_text_removes_stored_copy() {
    let mut favs = FavoriteSet::new();
    favs.toggle(john_3_16());
    favs.toggle(VerseRef::new("John", 3, 16, "freshly fetched text"));
    assert!(favs.is_empty());
    assert!(favs.verses().is_empty());
  }

  #[test]
  fn double_toggle_restores_prior_content() {
    let mut favs = FavoriteSet::new();
    favs.toggle(VerseRef::new("Genesis", 1, 1, "In the beginning"));
    favs.toggle(VerseRef::new("Psalms", 23, 1, "The Lord is my shepherd"));
    let before: HashSet<_> = favs.keys().clone();

    favs.toggle(john_3_16());
    favs.toggle(john_3_16());

    assert_eq!(favs.keys(), &before);
    let listed: HashSet<_> = favs.verses().iter().map(VerseRef::key).collect();
    assert_eq!(listed, before);
  }

  #[test]
  fn from_verses_drops_duplicate_keys() {
    let favs = FavoriteSet::from_verses([
      john_3_16(),
      VerseRef::new("John", 3, 16, "other text"),
      VerseRef::new("John", 3, 17, "For God did not send"),
    ]);
    assert_eq!(favs.len(), 2);
    assert_eq!(favs.verses().len(), 2);
    assert_eq!(favs.verses()[0].text, "For God so loved...");
  }

  #[test]
  fn get_returns_stored_copy() {
    let mut favs = FavoriteSet::new();
    favs.toggle(john_3_16());
    let stored = favs.get(&VerseKey::new("John", 3, 16)).unwrap();
    assert_eq!(stored.text, "For God so loved...");
    assert!(favs.get(&VerseKey::new("John", 3, 17)).is_none());
  }
}
