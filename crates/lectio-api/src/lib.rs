//! JSON REST API serving verse content for Lectio.
//!
//! Exposes an axum [`Router`] backed by any provider implementing
//! [`VerseProvider`] and [`BookCatalog`]. This is the hosted side of the
//! content provider contract; the terminal client talks to it over HTTP.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/books` | Ordered book names |
//! | `GET`  | `/chapters/{book}/{chapter}` | Verses of one chapter |
//! | `GET`  | `/search` | `?q=...` required; optional `limit` |
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", lectio_api::api_router(Arc::new(store)))
//! ```

pub mod books;
pub mod chapters;
pub mod error;
pub mod search;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use lectio_core::provider::{BookCatalog, VerseProvider};
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `LECTIO_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// Fill an empty book table from the built-in canon on startup.
  #[serde(default = "default_true")]
  pub seed_canon: bool,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 5233 }

fn default_store_path() -> PathBuf { PathBuf::from("lectio.db") }

fn default_true() -> bool { true }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `provider`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<P>(provider: Arc<P>) -> Router<()>
where
  P: VerseProvider + BookCatalog + 'static,
{
  Router::new()
    .route("/books", get(books::list::<P>))
    .route("/chapters/{book}/{chapter}", get(chapters::get_one::<P>))
    .route("/search", get(search::handler::<P>))
    .fallback(|| async { ApiError::NotFound("no such endpoint".into()) })
    .with_state(provider)
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use lectio_core::{ProviderError, memory::MemoryProvider, verse::VerseRef};
  use serde_json::Value;
  use tower::ServiceExt as _;

  async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  fn seeded() -> Router { api_router(Arc::new(MemoryProvider::seeded())) }

  // A provider whose every call fails with the given error.
  struct Failing(ProviderError);

  impl VerseProvider for Failing {
    async fn fetch_chapter(&self, _: &str, _: u32) -> Result<Vec<VerseRef>, ProviderError> {
      Err(self.0.clone())
    }
    async fn search(&self, _: &str) -> Result<Vec<VerseRef>, ProviderError> {
      Err(self.0.clone())
    }
  }

  impl BookCatalog for Failing {
    async fn list_books(&self) -> Result<Vec<String>, ProviderError> { Err(self.0.clone()) }
  }

  // ── Books ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn books_are_listed_in_order() {
    let (status, body) = get_json(seeded(), "/books").await;
    assert_eq!(status, StatusCode::OK);
    let books: Vec<String> = serde_json::from_value(body).unwrap();
    assert_eq!(books.first().map(String::as_str), Some("Genesis"));
    assert!(books.contains(&"John".to_string()));
  }

  // ── Chapters ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn chapter_returns_verses() {
    let (status, body) = get_json(seeded(), "/chapters/Psalms/23").await;
    assert_eq!(status, StatusCode::OK);
    let verses: Vec<VerseRef> = serde_json::from_value(body).unwrap();
    assert_eq!(verses.len(), 6);
    assert_eq!(verses[0].text, "The Lord is my shepherd, I lack nothing.");
  }

  #[tokio::test]
  async fn chapter_with_spaces_in_book_name() {
    let (status, body) = get_json(seeded(), "/chapters/Wisdom%20of%20Solomon/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
  }

  #[tokio::test]
  async fn empty_chapter_is_ok_and_empty() {
    let (status, body) = get_json(seeded(), "/chapters/John/4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
  }

  #[tokio::test]
  async fn chapter_zero_is_bad_request() {
    let (status, body) = get_json(seeded(), "/chapters/John/0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("numbered from 1"));
  }

  // ── Search ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn search_with_limit() {
    let (status, body) = get_json(seeded(), "/search?q=light&limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
  }

  #[tokio::test]
  async fn search_without_query_is_bad_request() {
    let (status, _) = get_json(seeded(), "/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get_json(seeded(), "/search?q=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Errors ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn provider_errors_map_to_status_codes() {
    let cases = [
      (ProviderError::NotFound("Hezekiah".into()), StatusCode::NOT_FOUND),
      (ProviderError::Timeout, StatusCode::GATEWAY_TIMEOUT),
      (ProviderError::Network("reset".into()), StatusCode::BAD_GATEWAY),
      (ProviderError::Backend("disk full".into()), StatusCode::BAD_GATEWAY),
    ];
    for (err, expected) in cases {
      let router = api_router(Arc::new(Failing(err)));
      let (status, body) = get_json(router, "/chapters/Hezekiah/1").await;
      assert_eq!(status, expected);
      assert!(body["error"].is_string());
    }
  }

  #[tokio::test]
  async fn unknown_route_is_json_404() {
    let (status, body) = get_json(seeded(), "/verses").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found: no such endpoint");
  }
}
