//! Error types for `lectio-core`.

use thiserror::Error;

use crate::{topic::TopicId, verse::VerseKey};

#[derive(Debug, Error)]
pub enum Error {
  /// A topic title was empty or whitespace-only. Nothing was created.
  #[error("topic title must not be empty")]
  EmptyTopicTitle,

  #[error("topic not found: {0}")]
  TopicNotFound(TopicId),

  #[error("verse not found: {0}")]
  VerseNotFound(VerseKey),

  #[error(transparent)]
  Provider(#[from] ProviderError),
}

impl Error {
  /// Validation failures are rejected locally; the caller re-prompts.
  pub fn is_validation(&self) -> bool { matches!(self, Self::EmptyTopicTitle) }

  /// Not-found conditions are absorbed as no-ops and never shown to the user.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::TopicNotFound(_) | Self::VerseNotFound(_))
  }
}

/// A failure reported by a verse content or book catalog provider.
///
/// An empty result list is a success, never a `ProviderError`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("network error: {0}")]
  Network(String),

  #[error("request timed out")]
  Timeout,

  #[error("provider error: {0}")]
  Backend(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
