//! [`StudyStore`] — the verse reference store.
//!
//! Owns the favorite set and the ordered list of study topics. Every method
//! runs synchronously and applies its whole mutation before returning, so a
//! caller rendering after any call always sees a consistent state.
//!
//! Not-found conditions (unknown topic id, verse missing from a topic) are
//! absorbed here: the mutation is skipped, a debug event is logged and the
//! method reports `false`. Only validation errors reach the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  Error, Result,
  favorites::FavoriteSet,
  topic::{Topic, TopicId},
  verse::{VerseKey, VerseRef},
};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// Serializable copy of the store, used by persistence backends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySnapshot {
  pub favorites: Vec<VerseRef>,
  pub topics:    Vec<Topic>,
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct StudyStore {
  favorites: FavoriteSet,
  topics:    Vec<Arc<Topic>>,
}

impl StudyStore {
  pub fn new() -> Self { Self::default() }

  /// Rebuild a store from a snapshot. Duplicate favorites, duplicate topic
  /// ids and duplicate verses inside a topic are dropped (first one wins).
  pub fn from_snapshot(snapshot: StudySnapshot) -> Self {
    let favorites = FavoriteSet::from_verses(snapshot.favorites);
    let mut topics: Vec<Arc<Topic>> = Vec::with_capacity(snapshot.topics.len());
    for mut topic in snapshot.topics {
      if topics.iter().any(|t| t.id == topic.id) {
        continue;
      }
      let mut verses: Vec<VerseRef> = Vec::with_capacity(topic.verses.len());
      for verse in topic.verses {
        if !verses.iter().any(|v| v.same_verse(&verse)) {
          verses.push(verse);
        }
      }
      topic.verses = verses;
      topics.push(Arc::new(topic));
    }
    Self { favorites, topics }
  }

  pub fn snapshot(&self) -> StudySnapshot {
    StudySnapshot {
      favorites: self.favorites.verses().to_vec(),
      topics:    self.topics.iter().map(|t| Topic::clone(t)).collect(),
    }
  }

  // ── Favorites ─────────────────────────────────────────────────────────────

  /// Add `verse` to the favorites, or remove it if its key is already there.
  pub fn toggle_favorite(&mut self, verse: VerseRef) {
    self.favorites.toggle(verse);
  }

  pub fn is_favorite(&self, key: &VerseKey) -> bool { self.favorites.contains(key) }

  pub fn favorites(&self) -> &FavoriteSet { &self.favorites }

  /// Favorite verses in the order they were added.
  pub fn favorite_verses(&self) -> &[VerseRef] { self.favorites.verses() }

  /// Find the record for `key`, looking first in `displayed` (the verse list
  /// currently on screen) and then in the favorites.
  ///
  /// The live list wins so that a verse toggled moments ago resolves even if
  /// the favorites copy is older.
  pub fn resolve<'a>(
    &'a self,
    key: &VerseKey,
    displayed: &'a [VerseRef],
  ) -> Option<&'a VerseRef> {
    displayed
      .iter()
      .find(|v| v.has_key(key))
      .or_else(|| self.favorites.get(key))
  }

  /// Like [`resolve`](Self::resolve) but reports a missing verse as
  /// [`Error::VerseNotFound`].
  pub fn try_resolve<'a>(
    &'a self,
    key: &VerseKey,
    displayed: &'a [VerseRef],
  ) -> Result<&'a VerseRef> {
    self
      .resolve(key, displayed)
      .ok_or_else(|| Error::VerseNotFound(key.clone()))
  }

  // ── Topics ────────────────────────────────────────────────────────────────

  /// Topics in creation order.
  pub fn topics(&self) -> &[Arc<Topic>] { &self.topics }

  pub fn topic(&self, id: TopicId) -> Option<&Arc<Topic>> {
    self.topics.iter().find(|t| t.id == id)
  }

  /// Create a topic and append it to the list.
  ///
  /// Fails with [`Error::EmptyTopicTitle`] when `title` is blank after
  /// trimming; the store is left unchanged.
  pub fn create_topic(&mut self, title: &str, description: &str) -> Result<Arc<Topic>> {
    self.create_topic_at(title, description, Utc::now())
  }

  /// [`create_topic`](Self::create_topic) with an explicit creation time.
  pub fn create_topic_at(
    &mut self,
    title: &str,
    description: &str,
    created_at: DateTime<Utc>,
  ) -> Result<Arc<Topic>> {
    let topic = Arc::new(Topic::create(title, description, created_at)?);
    let mut topics = self.topics.clone();
    topics.push(Arc::clone(&topic));
    self.topics = topics;
    debug!(topic = %topic.id, title = %topic.title, "topic created");
    Ok(topic)
  }

  /// Remove the topic `id`. Returns `false` if there was no such topic.
  pub fn delete_topic(&mut self, id: TopicId) -> bool {
    if self.topic(id).is_none() {
      debug!(error = %Error::TopicNotFound(id), "delete skipped");
      return false;
    }
    self.topics = self
      .topics
      .iter()
      .filter(|t| t.id != id)
      .cloned()
      .collect();
    true
  }

  /// Append `verse` to topic `id` unless the topic is missing or already
  /// holds a verse with the same key.
  pub fn add_verse_to_topic(&mut self, id: TopicId, verse: VerseRef) -> bool {
    let key = verse.key();
    self.replace_topic(id, |topic| topic.with_verse(verse), &key)
  }

  /// Remove the verse keyed `key` from topic `id`, if both exist.
  pub fn remove_verse_from_topic(&mut self, id: TopicId, key: &VerseKey) -> bool {
    self.replace_topic(id, |topic| topic.without_verse(key), key)
  }

  /// Favorites that topic `id` does not contain yet, in favorite order.
  pub fn favorites_not_in_topic(&self, id: TopicId) -> Vec<&VerseRef> {
    let Some(topic) = self.topic(id) else {
      return Vec::new();
    };
    self
      .favorites
      .verses()
      .iter()
      .filter(|v| !topic.contains(&v.key()))
      .collect()
  }

  /// Swap in the copy of topic `id` produced by `edit`. Other topics keep
  /// their `Arc`s, so they stay referentially identical.
  fn replace_topic(
    &mut self,
    id: TopicId,
    edit: impl FnOnce(&Topic) -> Option<Topic>,
    key: &VerseKey,
  ) -> bool {
    let Some(index) = self.topics.iter().position(|t| t.id == id) else {
      debug!(error = %Error::TopicNotFound(id), verse = %key, "topic edit skipped");
      return false;
    };
    let Some(edited) = edit(&self.topics[index]) else {
      debug!(topic = %id, verse = %key, "topic unchanged");
      return false;
    };
    let mut topics = self.topics.clone();
    topics[index] = Arc::new(edited);
    self.topics = topics;
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn john() -> VerseRef {
    VerseRef::new("John", 3, 16, "For God so loved...")
  }

  fn psalm() -> VerseRef {
    VerseRef::new("Psalms", 23, 1, "The Lord is my shepherd, I lack nothing.")
  }

  // ─── Favorites ─────────────────────────────────────────────────────────────

  #[test]
  fn toggle_scenario() {
    let mut store = StudyStore::new();
    store.toggle_favorite(john());
    assert_eq!(store.favorites().len(), 1);
    assert!(store.is_favorite(&VerseKey::new("John", 3, 16)));

    store.toggle_favorite(john());
    assert!(store.favorites().is_empty());
    assert!(store.favorite_verses().is_empty());
  }

  #[test]
  fn resolve_prefers_displayed_list() {
    let mut store = StudyStore::new();
    store.toggle_favorite(john());

    let displayed = vec![VerseRef::new("John", 3, 16, "live text")];
    let key = VerseKey::new("John", 3, 16);
    assert_eq!(store.resolve(&key, &displayed).unwrap().text, "live text");
    assert_eq!(store.resolve(&key, &[]).unwrap().text, "For God so loved...");
  }

  #[test]
  fn resolve_missing_everywhere_is_not_found() {
    let store = StudyStore::new();
    let key = VerseKey::new("Jude", 1, 25);
    assert!(store.resolve(&key, &[psalm()]).is_none());
    let err = store.try_resolve(&key, &[psalm()]).unwrap_err();
    assert!(err.is_not_found());
  }

  // ─── Topics ────────────────────────────────────────────────────────────────

  #[test]
  fn blank_titles_create_nothing() {
    let mut store = StudyStore::new();
    let err = store.create_topic("", "desc").unwrap_err();
    assert!(err.is_validation());
    assert!(store.create_topic("   ", "desc").is_err());
    assert!(store.topics().is_empty());
  }

  #[test]
  fn topic_verse_scenario() {
    let mut store = StudyStore::new();
    let t1 = store.create_topic("Faith", "").unwrap();
    assert!(t1.verses.is_empty());

    assert!(store.add_verse_to_topic(t1.id, john()));
    assert_eq!(store.topic(t1.id).unwrap().verses, vec![john()]);

    assert!(!store.add_verse_to_topic(t1.id, john()));
    assert_eq!(store.topic(t1.id).unwrap().verses.len(), 1);

    assert!(store.remove_verse_from_topic(t1.id, &john().key()));
    assert!(store.topic(t1.id).unwrap().verses.is_empty());
  }

  #[test]
  fn add_dedups_on_identity_not_text() {
    let mut store = StudyStore::new();
    let t = store.create_topic("Love", "").unwrap();
    store.add_verse_to_topic(t.id, john());
    store.add_verse_to_topic(t.id, VerseRef::new("John", 3, 16, "other text"));
    assert_eq!(store.topic(t.id).unwrap().verses.len(), 1);
  }

  #[test]
  fn deleted_topic_ignores_further_edits() {
    let mut store = StudyStore::new();
    let t1 = store.create_topic("Faith", "").unwrap();
    let t2 = store.create_topic("Hope", "").unwrap();

    assert!(store.delete_topic(t1.id));
    assert!(store.topic(t1.id).is_none());
    let before = store.snapshot();

    assert!(!store.add_verse_to_topic(t1.id, john()));
    assert!(!store.remove_verse_from_topic(t1.id, &john().key()));
    assert!(!store.delete_topic(t1.id));
    assert_eq!(store.snapshot(), before);
    assert_eq!(store.topics().len(), 1);
    assert_eq!(store.topics()[0].id, t2.id);
  }

  #[test]
  fn edits_leave_other_topics_shared() {
    let mut store = StudyStore::new();
    let a = store.create_topic("A", "").unwrap();
    let b = store.create_topic("B", "").unwrap();
    let b_before = Arc::clone(store.topic(b.id).unwrap());

    store.add_verse_to_topic(a.id, psalm());

    assert!(Arc::ptr_eq(store.topic(b.id).unwrap(), &b_before));
    assert!(!Arc::ptr_eq(store.topic(a.id).unwrap(), &a));
    assert!(a.verses.is_empty(), "previously handed out copy is unchanged");
  }

  #[test]
  fn topics_keep_creation_order() {
    let mut store = StudyStore::new();
    for title in ["Faith", "Hope", "Love"] {
      store.create_topic(title, "").unwrap();
    }
    let titles: Vec<_> = store.topics().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["Faith", "Hope", "Love"]);
  }

  #[test]
  fn favorites_not_in_topic_filters_by_key() {
    let mut store = StudyStore::new();
    store.toggle_favorite(john());
    store.toggle_favorite(psalm());
    let t = store.create_topic("Comfort", "").unwrap();
    store.add_verse_to_topic(t.id, psalm());

    let candidates = store.favorites_not_in_topic(t.id);
    assert_eq!(candidates, vec![&john()]);
    assert!(store.favorites_not_in_topic(TopicId::new()).is_empty());
  }

  // ─── Snapshots ─────────────────────────────────────────────────────────────

  #[test]
  fn snapshot_roundtrip_preserves_order_and_ids() {
    let mut store = StudyStore::new();
    store.toggle_favorite(psalm());
    store.toggle_favorite(john());
    let t = store.create_topic("Faith", "trust").unwrap();
    store.add_verse_to_topic(t.id, john());

    let restored = StudyStore::from_snapshot(store.snapshot());
    assert_eq!(restored.snapshot(), store.snapshot());
    assert_eq!(restored.topics()[0].id, t.id);
  }

  #[test]
  fn from_snapshot_repairs_duplicates() {
    let topic = Topic {
      verses: vec![john(), VerseRef::new("John", 3, 16, "dup")],
      ..Topic::create("Faith", "", Utc::now()).unwrap()
    };
    let snapshot = StudySnapshot {
      favorites: vec![john(), john()],
      topics:    vec![topic.clone(), topic],
    };
    let store = StudyStore::from_snapshot(snapshot);
    assert_eq!(store.favorites().len(), 1);
    assert_eq!(store.topics().len(), 1);
    assert_eq!(store.topics()[0].verses.len(), 1);
  }
}
