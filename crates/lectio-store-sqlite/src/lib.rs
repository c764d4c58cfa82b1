//! SQLite backend for Lectio.
//!
//! Serves verse content and the book list from SQLite tables, and persists
//! study state (favorites and topics). Wraps [`tokio_rusqlite`] so all
//! database access runs on a dedicated thread without blocking the async
//! runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
