//! Handler for `GET /chapters/{book}/{chapter}`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use lectio_core::{provider::VerseProvider, verse::VerseRef};

use crate::error::ApiError;

/// `GET /chapters/{book}/{chapter}` — every verse of the chapter, in order.
///
/// An unknown chapter of a known book yields `200 []`; chapter `0` is
/// rejected with 400.
pub async fn get_one<P>(
  State(provider): State<Arc<P>>,
  Path((book, chapter)): Path<(String, u32)>,
) -> Result<Json<Vec<VerseRef>>, ApiError>
where
  P: VerseProvider,
{
  if book.trim().is_empty() {
    return Err(ApiError::BadRequest("book must not be empty".into()));
  }
  if chapter == 0 {
    return Err(ApiError::BadRequest("chapters are numbered from 1".into()));
  }
  let verses = provider.fetch_chapter(book.trim(), chapter).await?;
  Ok(Json(verses))
}
