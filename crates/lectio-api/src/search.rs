//! Handler for `GET /search`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use lectio_core::{provider::VerseProvider, verse::VerseRef};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  /// Free-text query matched against verse text and book names.
  #[serde(default)]
  pub q:     String,
  /// Truncate the result list to at most this many verses.
  pub limit: Option<usize>,
}

/// `GET /search?q=...[&limit=n]`
pub async fn handler<P>(
  State(provider): State<Arc<P>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<VerseRef>>, ApiError>
where
  P: VerseProvider,
{
  let query = params.q.trim();
  if query.is_empty() {
    return Err(ApiError::BadRequest("query parameter `q` is required".into()));
  }
  let mut verses = provider.search(query).await?;
  if let Some(limit) = params.limit {
    verses.truncate(limit);
  }
  Ok(Json(verses))
}
