//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use lectio_core::ProviderError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Provider(#[from] ProviderError),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::NotFound(_) | ApiError::Provider(ProviderError::NotFound(_)) => {
        StatusCode::NOT_FOUND
      }
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Provider(ProviderError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
      ApiError::Provider(_) => StatusCode::BAD_GATEWAY,
    };
    if status.is_server_error() {
      tracing::warn!(error = %self, "provider failure");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
