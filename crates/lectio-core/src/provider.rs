//! Boundary traits: verse content, book catalog and study persistence.
//!
//! Implemented by backends (`lectio-store-sqlite`, the in-memory
//! [`MemoryProvider`](crate::memory::MemoryProvider), the CLI's HTTP client).
//! Higher layers depend on these abstractions, not on a concrete source.

use std::future::Future;

use tracing::warn;

use crate::{ProviderError, study::StudySnapshot, verse::VerseRef};

// ─── Verse content ───────────────────────────────────────────────────────────

/// Source of verse text.
///
/// Both methods may fail with a [`ProviderError`]. An empty list is a valid
/// success (no such chapter content, no matches), distinct from failure.
///
/// All methods return `Send` futures so fetches can be spawned onto a
/// multi-threaded tokio runtime.
pub trait VerseProvider: Send + Sync {
  /// All verses of `book` `chapter`, in verse order.
  fn fetch_chapter<'a>(
    &'a self,
    book: &'a str,
    chapter: u32,
  ) -> impl Future<Output = Result<Vec<VerseRef>, ProviderError>> + Send + 'a;

  /// Verses matching the free-text `query`.
  fn search<'a>(
    &'a self,
    query: &'a str,
  ) -> impl Future<Output = Result<Vec<VerseRef>, ProviderError>> + Send + 'a;
}

// ─── Book catalog ────────────────────────────────────────────────────────────

/// Source of the ordered list of book names shown for book selection.
pub trait BookCatalog: Send + Sync {
  fn list_books(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, ProviderError>> + Send + '_;
}

/// List books from `catalog`, degrading any failure to an empty list.
pub async fn books_or_empty<C: BookCatalog>(catalog: &C) -> Vec<String> {
  match catalog.list_books().await {
    Ok(books) => books,
    Err(err) => {
      warn!(error = %err, "book catalog unavailable");
      Vec::new()
    }
  }
}

// ─── Persistence ─────────────────────────────────────────────────────────────

/// Storage for favorites and topics across sessions.
///
/// The store itself is process-lifetime state; a repository only loads a
/// [`StudySnapshot`] at startup and saves one after mutations.
pub trait StudyRepository: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The last saved snapshot, or `None` if nothing was saved yet.
  fn load(
    &self,
  ) -> impl Future<Output = Result<Option<StudySnapshot>, Self::Error>> + Send + '_;

  /// Replace the saved state with `snapshot`.
  fn save<'a>(
    &'a self,
    snapshot: &'a StudySnapshot,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Offline;

  impl BookCatalog for Offline {
    async fn list_books(&self) -> Result<Vec<String>, ProviderError> {
      Err(ProviderError::Network("connection refused".into()))
    }
  }

  #[tokio::test]
  async fn catalog_failure_degrades_to_empty() {
    assert!(books_or_empty(&Offline).await.is_empty());
  }
}
