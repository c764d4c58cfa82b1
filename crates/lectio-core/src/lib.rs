//! Core types and trait definitions for Lectio.
//!
//! This crate holds the verse reference store (favorites and study topics),
//! the display-mode state machine that decides which verse list is shown, and
//! the provider traits that supply verse content. It has no HTTP or database
//! dependencies; the backend and front-end crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod canon;
pub mod display;
pub mod error;
pub mod favorites;
pub mod memory;
pub mod provider;
pub mod study;
pub mod topic;
pub mod verse;

pub use error::{Error, ProviderError, Result};
