//! Error type for `lectio-store-sqlite`.

use lectio_core::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("book not found: {0}")]
  BookNotFound(String),
}

impl From<Error> for ProviderError {
  fn from(err: Error) -> Self {
    match err {
      Error::BookNotFound(book) => ProviderError::NotFound(book),
      other => ProviderError::Backend(other.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
