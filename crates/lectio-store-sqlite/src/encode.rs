//! Conversions between domain types and the plain values stored in SQLite
//! columns.
//!
//! Timestamps are stored as RFC 3339 strings and topic ids as hyphenated
//! lowercase UUIDs.

use chrono::{DateTime, Utc};
use lectio_core::{
  topic::{Topic, TopicId},
  verse::VerseRef,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_topic_id(id: TopicId) -> String { id.0.hyphenated().to_string() }

pub fn decode_topic_id(s: &str) -> Result<TopicId> { Ok(TopicId(Uuid::parse_str(s)?)) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row helpers ──────────────────────────────────────────────────────────────

/// Read a verse from columns `offset..offset + 4` (book, chapter, verse, text).
pub fn verse_from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<VerseRef> {
  Ok(VerseRef {
    book:    row.get(offset)?,
    chapter: row.get(offset + 1)?,
    verse:   row.get(offset + 2)?,
    text:    row.get(offset + 3)?,
  })
}

// ─── Raw row types ────────────────────────────────────────────────────────────

/// A `topics` row with undecoded id and timestamp.
pub struct RawTopic {
  pub topic_id:    String,
  pub title:       String,
  pub description: String,
  pub created_at:  String,
}

impl RawTopic {
  pub fn into_topic(self, verses: Vec<VerseRef>) -> Result<Topic> {
    Ok(Topic {
      id: decode_topic_id(&self.topic_id)?,
      title: self.title,
      description: self.description,
      verses,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A `topic_verses` row tagged with its owning topic id.
pub struct RawTopicVerse {
  pub topic_id: String,
  pub verse:    VerseRef,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_roundtrip() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }

  #[test]
  fn topic_ids_roundtrip() {
    let id = TopicId::new();
    assert_eq!(decode_topic_id(&encode_topic_id(id)).unwrap(), id);
    assert!(decode_topic_id("not-a-uuid").is_err());
  }
}
