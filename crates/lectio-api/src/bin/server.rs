//! lectio-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite verse store, and serves the JSON content API over HTTP.
//!
//! # Importing verse content
//!
//! The store starts empty. Load a JSON array of verses and exit:
//!
//! ```
//! cargo run -p lectio-api --bin lectio-server -- --import verses.json
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use lectio_api::ServerConfig;
use lectio_core::{
  canon,
  provider::BookCatalog as _,
  verse::VerseRef,
};
use lectio_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Lectio verse content server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Import verses from a JSON file into the store and exit.
  #[arg(long, value_name = "FILE")]
  import: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("LECTIO"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if server_cfg.seed_canon && store.list_books().await?.is_empty() {
    let names = canon::BOOKS.iter().map(|b| b.name.to_owned()).collect();
    store.set_books(names).await.context("failed to seed book catalog")?;
    tracing::info!(books = canon::BOOKS.len(), "seeded book catalog from canon");
  }

  // Helper mode: import verses and exit.
  if let Some(path) = cli.import {
    return import(&store, &path).await;
  }

  let app = axum::Router::new()
    .nest("/api", lectio_api::api_router(Arc::new(store)))
    .layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a JSON array of verses from `path` and write them to the store.
async fn import(store: &SqliteStore, path: &Path) -> anyhow::Result<()> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read {}", path.display()))?;
  let verses: Vec<VerseRef> = serde_json::from_str(&raw)
    .with_context(|| format!("failed to parse verses in {}", path.display()))?;

  let unknown: Vec<&str> = verses
    .iter()
    .map(|v| v.book.as_str())
    .filter(|b| canon::lookup(b).is_none())
    .collect();
  if !unknown.is_empty() {
    tracing::warn!(count = unknown.len(), first = unknown[0], "importing verses outside the canon");
  }

  let written = store.import_verses(verses).await.context("import failed")?;
  println!("imported {written} verses");
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
