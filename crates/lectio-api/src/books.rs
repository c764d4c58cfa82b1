//! Handler for `GET /books`.

use std::sync::Arc;

use axum::{Json, extract::State};
use lectio_core::provider::BookCatalog;

use crate::error::ApiError;

/// `GET /books` — ordered book names.
pub async fn list<P>(State(provider): State<Arc<P>>) -> Result<Json<Vec<String>>, ApiError>
where
  P: BookCatalog,
{
  let books = provider.list_books().await?;
  Ok(Json(books))
}
