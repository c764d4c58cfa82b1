//! Study topics — user-named, ordered collections of verses.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  verse::{VerseKey, VerseRef, position_of},
};

/// Stable identifier of a topic, assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(pub Uuid);

impl TopicId {
  pub fn new() -> Self { Self(Uuid::new_v4()) }
}

impl Default for TopicId {
  fn default() -> Self { Self::new() }
}

impl fmt::Display for TopicId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// A titled, insertion-ordered collection of verses.
///
/// A verse appears at most once per topic (by identity key). Topics are
/// treated as values: the `with_*` / `without_*` methods return modified
/// copies and leave `self` untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
  pub id:          TopicId,
  pub title:       String,
  pub description: String,
  pub verses:      Vec<VerseRef>,
  pub created_at:  DateTime<Utc>,
}

impl Topic {
  /// Validate `title` and build an empty topic stamped with `created_at`.
  ///
  /// The title is trimmed; an empty result is rejected with
  /// [`Error::EmptyTopicTitle`]. The description is kept as given.
  pub fn create(
    title: &str,
    description: &str,
    created_at: DateTime<Utc>,
  ) -> Result<Self> {
    let title = title.trim();
    if title.is_empty() {
      return Err(Error::EmptyTopicTitle);
    }
    Ok(Self {
      id: TopicId::new(),
      title: title.to_owned(),
      description: description.to_owned(),
      verses: Vec::new(),
      created_at,
    })
  }

  pub fn contains(&self, key: &VerseKey) -> bool {
    position_of(&self.verses, key).is_some()
  }

  /// A copy with `verse` appended, or `None` if its key is already present.
  pub fn with_verse(&self, verse: VerseRef) -> Option<Self> {
    if self.contains(&verse.key()) {
      return None;
    }
    let mut next = self.clone();
    next.verses.push(verse);
    Some(next)
  }

  /// A copy without the verse keyed `key`, or `None` if it is absent.
  pub fn without_verse(&self, key: &VerseKey) -> Option<Self> {
    let index = position_of(&self.verses, key)?;
    let mut next = self.clone();
    next.verses.remove(index);
    Some(next)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn create_trims_and_rejects_blank_titles() {
    let now = Utc::now();
    assert!(matches!(Topic::create("", "desc", now), Err(Error::EmptyTopicTitle)));
    assert!(matches!(Topic::create("   ", "desc", now), Err(Error::EmptyTopicTitle)));

    let topic = Topic::create("  Faith ", "  Hebrews 11 first\n", now).unwrap();
    assert_eq!(topic.title, "Faith");
    assert_eq!(topic.description, "  Hebrews 11 first\n");
    assert!(topic.verses.is_empty());
    assert_eq!(topic.created_at, now);
  }

  #[test]
  fn with_verse_is_idempotent_by_key() {
    let topic = Topic::create("Faith", "", Utc::now()).unwrap();
    let john = VerseRef::new("John", 3, 16, "For God so loved...");

    let once = topic.with_verse(john.clone()).unwrap();
    assert_eq!(once.verses, vec![john.clone()]);
    assert!(topic.verses.is_empty(), "source topic is untouched");

    let retext = VerseRef::new("John", 3, 16, "different text");
    assert!(once.with_verse(retext).is_none());
  }

  #[test]
  fn without_verse_removes_by_key() {
    let topic = Topic::create("Faith", "", Utc::now())
      .unwrap()
      .with_verse(VerseRef::new("John", 3, 16, "For God so loved..."))
      .unwrap();
    let key = VerseKey::new("John", 3, 16);

    let emptied = topic.without_verse(&key).unwrap();
    assert!(emptied.verses.is_empty());
    assert!(emptied.without_verse(&key).is_none());
    assert_eq!(emptied.id, topic.id);
    assert_eq!(emptied.created_at, topic.created_at);
  }
}
