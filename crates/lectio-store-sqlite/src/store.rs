//! [`SqliteStore`] — verse content, book catalog and study persistence on
//! SQLite.

use std::path::Path;

use lectio_core::{
  ProviderError, canon,
  provider::{BookCatalog, StudyRepository, VerseProvider},
  study::StudySnapshot,
  verse::VerseRef,
};
use rusqlite::OptionalExtension as _;
use tracing::{debug, info};

use crate::{
  Error, Result,
  encode::{RawTopic, RawTopicVerse, encode_dt, encode_topic_id, verse_from_row},
  schema::SCHEMA,
};

/// Upper bound on rows returned by a search.
pub(crate) const SEARCH_LIMIT: usize = 200;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lectio store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Seeding ───────────────────────────────────────────────────────────────

  /// Insert or replace verse content. Returns the number of rows written.
  pub async fn import_verses(&self, verses: Vec<VerseRef>) -> Result<usize> {
    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut written = 0;
        {
          let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO verses (book, chapter, verse, text)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for v in &verses {
            written += stmt.execute(rusqlite::params![v.book, v.chapter, v.verse, v.text])?;
          }
        }
        tx.commit()?;
        Ok(written)
      })
      .await?;
    info!(written, "imported verses");
    Ok(written)
  }

  /// Replace the book catalog with `books`, in the given order.
  pub async fn set_books(&self, books: Vec<String>) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM books", [])?;
        {
          let mut stmt = tx.prepare("INSERT OR IGNORE INTO books (position, name) VALUES (?1, ?2)")?;
          for (position, name) in books.iter().enumerate() {
            stmt.execute(rusqlite::params![position as i64, name])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn book_is_known(&self, book: String) -> Result<bool> {
    let known = self
      .conn
      .call(move |conn| {
        let catalog_empty: bool = conn
          .query_row("SELECT NOT EXISTS (SELECT 1 FROM books)", [], |r| r.get(0))?;
        if catalog_empty {
          return Ok(true);
        }
        let found = conn
          .query_row(
            "SELECT 1 FROM books WHERE name = ?1 COLLATE NOCASE",
            rusqlite::params![book],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        Ok(found)
      })
      .await?;
    Ok(known)
  }

  async fn chapter(&self, book: &str, chapter: u32) -> Result<Vec<VerseRef>> {
    if !self.book_is_known(book.to_owned()).await? {
      return Err(Error::BookNotFound(book.to_owned()));
    }
    let book = book.to_owned();
    let verses = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT book, chapter, verse, text FROM verses
           WHERE book = ?1 COLLATE NOCASE AND chapter = ?2
           ORDER BY verse",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![book, chapter], |row| verse_from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(verses)
  }

  /// Verses whose text or book name contains `query`, in canon order.
  ///
  /// Canon position is not known to SQLite (the `books` table may be
  /// empty), so every match is ordered here before the limit is applied.
  async fn search_verses(&self, query: &str) -> Result<Vec<VerseRef>> {
    let pattern = format!("%{}%", escape_like(query.trim()));
    let mut verses = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT book, chapter, verse, text FROM verses
           WHERE text LIKE ?1 ESCAPE '\\' OR book LIKE ?1 ESCAPE '\\'",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![pattern], |row| verse_from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    verses.sort_by(|a, b| {
      let pa = canon::position(&a.book).unwrap_or(usize::MAX);
      let pb = canon::position(&b.book).unwrap_or(usize::MAX);
      (pa, &a.book, a.chapter, a.verse).cmp(&(pb, &b.book, b.chapter, b.verse))
    });
    if verses.len() > SEARCH_LIMIT {
      debug!(matches = verses.len(), "truncating search results");
      verses.truncate(SEARCH_LIMIT);
    }
    Ok(verses)
  }

  async fn books(&self) -> Result<Vec<String>> {
    let books = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT name FROM books ORDER BY position")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(books)
  }
}

/// Escape `%`, `_` and the escape character itself for a `LIKE` pattern.
fn escape_like(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for c in raw.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

// ─── Provider impls ──────────────────────────────────────────────────────────

impl VerseProvider for SqliteStore {
  async fn fetch_chapter(
    &self,
    book: &str,
    chapter: u32,
  ) -> Result<Vec<VerseRef>, ProviderError> {
    Ok(self.chapter(book, chapter).await?)
  }

  async fn search(&self, query: &str) -> Result<Vec<VerseRef>, ProviderError> {
    if query.trim().is_empty() {
      return Ok(Vec::new());
    }
    Ok(self.search_verses(query).await?)
  }
}

impl BookCatalog for SqliteStore {
  async fn list_books(&self) -> Result<Vec<String>, ProviderError> {
    Ok(self.books().await?)
  }
}

// ─── StudyRepository impl ────────────────────────────────────────────────────

impl StudyRepository for SqliteStore {
  type Error = Error;

  async fn load(&self) -> Result<Option<StudySnapshot>> {
    let (saved, favorites, raw_topics, raw_verses) = self
      .conn
      .call(|conn| {
        let saved: bool = conn.query_row(
          "SELECT EXISTS (SELECT 1 FROM favorites) OR EXISTS (SELECT 1 FROM topics)",
          [],
          |r| r.get(0),
        )?;

        let favorites = conn
          .prepare("SELECT book, chapter, verse, text FROM favorites ORDER BY position")?
          .query_map([], |row| verse_from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let topics = conn
          .prepare(
            "SELECT topic_id, title, description, created_at FROM topics
             ORDER BY position",
          )?
          .query_map([], |row| {
            Ok(RawTopic {
              topic_id:    row.get(0)?,
              title:       row.get(1)?,
              description: row.get(2)?,
              created_at:  row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let verses = conn
          .prepare(
            "SELECT topic_id, book, chapter, verse, text FROM topic_verses
             ORDER BY topic_id, position",
          )?
          .query_map([], |row| {
            Ok(RawTopicVerse {
              topic_id: row.get(0)?,
              verse:    verse_from_row(row, 1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((saved, favorites, topics, verses))
      })
      .await?;

    if !saved {
      return Ok(None);
    }

    let topics = raw_topics
      .into_iter()
      .map(|raw| {
        let verses = raw_verses
          .iter()
          .filter(|v| v.topic_id == raw.topic_id)
          .map(|v| v.verse.clone())
          .collect();
        raw.into_topic(verses)
      })
      .collect::<Result<Vec<_>>>()?;

    debug!(favorites = favorites.len(), topics = topics.len(), "loaded study state");
    Ok(Some(StudySnapshot { favorites, topics }))
  }

  async fn save(&self, snapshot: &StudySnapshot) -> Result<()> {
    let favorites = snapshot.favorites.clone();
    let topics: Vec<_> = snapshot
      .topics
      .iter()
      .map(|t| {
        (
          encode_topic_id(t.id),
          t.title.clone(),
          t.description.clone(),
          encode_dt(t.created_at),
          t.verses.clone(),
        )
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM topic_verses", [])?;
        tx.execute("DELETE FROM topics", [])?;
        tx.execute("DELETE FROM favorites", [])?;
        {
          let mut fav = tx.prepare(
            "INSERT OR IGNORE INTO favorites (position, book, chapter, verse, text)
             VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for (position, v) in favorites.iter().enumerate() {
            fav.execute(rusqlite::params![position as i64, v.book, v.chapter, v.verse, v.text])?;
          }

          let mut topic_stmt = tx.prepare(
            "INSERT INTO topics (topic_id, position, title, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          let mut verse_stmt = tx.prepare(
            "INSERT OR IGNORE INTO topic_verses (topic_id, position, book, chapter, verse, text)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          )?;
          for (position, (id, title, description, created_at, verses)) in topics.iter().enumerate() {
            topic_stmt.execute(rusqlite::params![
              id,
              position as i64,
              title,
              description,
              created_at,
            ])?;
            for (vpos, v) in verses.iter().enumerate() {
              verse_stmt.execute(rusqlite::params![
                id,
                vpos as i64,
                v.book,
                v.chapter,
                v.verse,
                v.text,
              ])?;
            }
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    debug!(
      favorites = snapshot.favorites.len(),
      topics = snapshot.topics.len(),
      "saved study state"
    );
    Ok(())
  }
}
