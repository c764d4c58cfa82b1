//! `lectio` — terminal UI for reading and studying scripture.
//!
//! # Usage
//!
//! ```
//! lectio --url http://localhost:5233
//! lectio --offline --data ~/.local/share/lectio/study.db
//! lectio --config ~/.config/lectio/config.toml --log /tmp/lectio.log
//! ```

mod app;
mod client;
mod ui;

use std::{
  io,
  path::{Path, PathBuf},
  sync::Mutex,
  time::Duration,
};

use anyhow::{Context, Result};
use app::{App, Fetched};
use clap::Parser;
use client::{ApiClient, ApiConfig, Source};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use lectio_core::memory::MemoryProvider;
use lectio_store_sqlite::SqliteStore;
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "lectio", about = "Terminal UI for reading and studying scripture")]
struct Args {
  /// Path to a TOML config file (url, data, offline, book, chapter).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the lectio server (default: http://localhost:5233).
  #[arg(long, env = "LECTIO_URL")]
  url: Option<String>,

  /// Read from the built-in sample verses instead of a server.
  #[arg(long)]
  offline: bool,

  /// SQLite file that keeps favorites and topics between sessions.
  #[arg(long, value_name = "FILE", env = "LECTIO_DATA")]
  data: Option<PathBuf>,

  /// Book to open on start.
  #[arg(long)]
  book: Option<String>,

  /// Chapter to open on start.
  #[arg(long)]
  chapter: Option<u32>,

  /// Write logs to this file. The terminal itself is never logged to.
  #[arg(long, value_name = "FILE")]
  log: Option<PathBuf>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:     String,
  #[serde(default)]
  data:    String,
  #[serde(default)]
  offline: bool,
  #[serde(default)]
  book:    String,
  #[serde(default)]
  chapter: Option<u32>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(path) = &args.log {
    init_logging(path)?;
  }

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let source = if args.offline || file_cfg.offline {
    Source::Memory(MemoryProvider::seeded())
  } else {
    let base_url = args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:5233".to_string());
    Source::Http(ApiClient::new(ApiConfig {
      base_url,
      timeout: Duration::from_secs(10),
    })?)
  };
  let data = args
    .data
    .or_else(|| (!file_cfg.data.is_empty()).then(|| PathBuf::from(&file_cfg.data)));
  let book = args
    .book
    .or_else(|| (!file_cfg.book.is_empty()).then(|| file_cfg.book.clone()))
    .unwrap_or_else(|| "Genesis".to_string());
  let chapter = args.chapter.or(file_cfg.chapter).unwrap_or(1).max(1);

  let repo = match data {
    Some(path) => {
      let path = expand_tilde(&path);
      Some(
        SqliteStore::open(&path)
          .await
          .with_context(|| format!("failed to open study data at {path:?}"))?,
      )
    }
    None => None,
  };

  let (tx, rx) = mpsc::unbounded_channel();
  let mut app = App::new(source, repo, tx, &book, chapter);
  app.start().await.context("loading study data")?;

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = run_event_loop(&mut terminal, &mut app, rx).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

fn init_logging(path: &Path) -> Result<()> {
  let file = std::fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .with_context(|| format!("opening log file {}", path.display()))?;
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_ansi(false)
    .with_writer(Mutex::new(file))
    .init();
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

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
  mut rx: UnboundedReceiver<Fetched>,
) -> Result<()> {
  loop {
    // Fold in every fetch that finished since the last frame.
    while let Ok(fetched) = rx.try_recv() {
      app.apply(fetched);
    }

    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(evt) = maybe_event {
      match evt {
        Event::Key(key) => {
          if !app.handle_key(key).await {
            break;
          }
        }
        Event::Resize(_, _) => {
          // Terminal will redraw on next iteration.
        }
        _ => {}
      }
    }
  }

  Ok(())
}
