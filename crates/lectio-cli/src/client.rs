//! Verse sources for the terminal client: the lectio JSON API over HTTP, or
//! the built-in sample set when running offline.

use std::time::Duration;

use anyhow::{Context, Result};
use lectio_core::{
  ProviderError,
  memory::MemoryProvider,
  provider::{BookCatalog, VerseProvider},
  verse::VerseRef,
};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

/// Connection settings for the lectio API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

/// Async HTTP client for the lectio JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  base:   Url,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .context("failed to build HTTP client")?;
    let base = Url::parse(&config.base_url)
      .with_context(|| format!("invalid server URL {}", config.base_url))?;
    if base.cannot_be_a_base() {
      anyhow::bail!("server URL {} cannot carry a path", config.base_url);
    }
    Ok(Self { client, base })
  }

  /// `{base}/api/{segments...}`, each segment percent-encoded.
  fn url(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().push("api").extend(segments);
    }
    url
  }

  async fn get_json<T: DeserializeOwned>(
    &self,
    url: Url,
    query: &[(&str, &str)],
  ) -> Result<T, ProviderError> {
    let path = url.path().to_owned();
    let resp = self
      .client
      .get(url)
      .query(query)
      .send()
      .await
      .map_err(transport_error)?;

    match resp.status() {
      status if status.is_success() => resp
        .json()
        .await
        .map_err(|e| ProviderError::Backend(format!("deserialising {path}: {e}"))),
      StatusCode::NOT_FOUND => Err(ProviderError::NotFound(path)),
      StatusCode::GATEWAY_TIMEOUT => Err(ProviderError::Timeout),
      status => Err(ProviderError::Backend(format!("GET {path} → {status}"))),
    }
  }
}

fn transport_error(err: reqwest::Error) -> ProviderError {
  if err.is_timeout() {
    ProviderError::Timeout
  } else {
    ProviderError::Network(err.to_string())
  }
}

impl VerseProvider for ApiClient {
  /// `GET /api/chapters/{book}/{chapter}`
  async fn fetch_chapter(&self, book: &str, chapter: u32) -> Result<Vec<VerseRef>, ProviderError> {
    let chapter = chapter.to_string();
    self.get_json(self.url(&["chapters", book, &chapter]), &[]).await
  }

  /// `GET /api/search?q=...`
  async fn search(&self, query: &str) -> Result<Vec<VerseRef>, ProviderError> {
    self.get_json(self.url(&["search"]), &[("q", query)]).await
  }
}

impl BookCatalog for ApiClient {
  /// `GET /api/books`
  async fn list_books(&self) -> Result<Vec<String>, ProviderError> {
    self.get_json(self.url(&["books"]), &[]).await
  }
}

// ─── Source ───────────────────────────────────────────────────────────────────

/// Where the client reads verses from.
#[derive(Clone)]
pub enum Source {
  Http(ApiClient),
  Memory(MemoryProvider),
}

impl VerseProvider for Source {
  async fn fetch_chapter(&self, book: &str, chapter: u32) -> Result<Vec<VerseRef>, ProviderError> {
    match self {
      Source::Http(client) => client.fetch_chapter(book, chapter).await,
      Source::Memory(memory) => memory.fetch_chapter(book, chapter).await,
    }
  }

  async fn search(&self, query: &str) -> Result<Vec<VerseRef>, ProviderError> {
    match self {
      Source::Http(client) => client.search(query).await,
      Source::Memory(memory) => memory.search(query).await,
    }
  }
}

impl BookCatalog for Source {
  async fn list_books(&self) -> Result<Vec<String>, ProviderError> {
    match self {
      Source::Http(client) => client.list_books().await,
      Source::Memory(memory) => memory.list_books().await,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(base: &str) -> ApiClient {
    ApiClient::new(ApiConfig {
      base_url: base.to_string(),
      timeout:  Duration::from_secs(1),
    })
    .unwrap()
  }

  #[test]
  fn url_encodes_book_names() {
    let c = client("http://localhost:5233");
    let url = c.url(&["chapters", "Song of Solomon", "2"]);
    assert_eq!(url.as_str(), "http://localhost:5233/api/chapters/Song%20of%20Solomon/2");
  }

  #[test]
  fn url_keeps_base_path() {
    let c = client("https://example.org/lectio/");
    assert_eq!(c.url(&["books"]).as_str(), "https://example.org/lectio/api/books");
  }

  #[test]
  fn rejects_unusable_base_url() {
    let config = ApiConfig {
      base_url: "mailto:someone@example.org".into(),
      timeout:  Duration::from_secs(1),
    };
    assert!(ApiClient::new(config).is_err());
  }

  #[tokio::test]
  async fn memory_source_delegates() {
    let source = Source::Memory(MemoryProvider::seeded());
    assert_eq!(source.fetch_chapter("Genesis", 1).await.unwrap().len(), 5);
    assert!(!source.list_books().await.unwrap().is_empty());
  }
}
