//! Application state machine and event dispatcher.
//!
//! [`App`] owns the study store and the reader, turns key presses into store
//! mutations and provider fetches, and applies fetch results as they arrive
//! on the [`Fetched`] channel. The `ui` module only reads from it.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use lectio_core::{
  ProviderError,
  canon::{self, Testament},
  display::{Completion, DisplayMode, FetchTicket, Reader, RequestGate},
  provider::{self, StudyRepository, VerseProvider},
  study::StudyStore,
  topic::TopicId,
  verse::{self, VerseKey, VerseRef},
};
use lectio_store_sqlite::SqliteStore;
use strum::{Display, EnumIter, IntoEnumIterator};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::client::Source;

// ─── Tabs and modes ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Tab {
  Read,
  Books,
  Favorites,
  Topics,
}

impl Tab {
  fn offset(self, by: isize) -> Self {
    let all: Vec<Tab> = Tab::iter().collect();
    let index = all.iter().position(|t| *t == self).unwrap_or(0) as isize;
    let len = all.len() as isize;
    all[(index + by).rem_euclid(len) as usize]
  }
}

/// What a line of text input is being collected for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
  Search,
  BookFilter,
  TopicTitle,
  TopicDescription { title: String },
  TopicSearch,
}

impl Prompt {
  pub fn label(&self) -> &'static str {
    match self {
      Prompt::Search => "Search",
      Prompt::BookFilter => "Filter books",
      Prompt::TopicTitle => "Topic title",
      Prompt::TopicDescription { .. } => "Description",
      Prompt::TopicSearch => "Find verses",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
  pub prompt: Prompt,
  pub buffer: String,
}

impl Input {
  fn new(prompt: Prompt) -> Self { Self { prompt, buffer: String::new() } }
}

/// Drill-down level of the books explorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BooksLevel {
  Categories,
  Chapters { book: String },
  Verses { book: String, chapter: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicsView {
  List,
  Detail { id: TopicId },
  /// The search-to-add panel for topic `id`.
  AddVerses { id: TopicId },
}

/// One row of the books explorer's category listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookEntry<'a> {
  /// `None` for catalog books outside the built-in canon.
  pub group: Option<Testament>,
  pub name:  &'a str,
}

// ─── Fetch results ────────────────────────────────────────────────────────────

/// The outcome of a spawned provider call, sent back to the event loop.
#[derive(Debug)]
pub enum Fetched {
  Catalog(Vec<String>),
  Reader {
    ticket: FetchTicket,
    result: Result<Vec<VerseRef>, ProviderError>,
  },
  BookChapter {
    seq:    u64,
    result: Result<Vec<VerseRef>, ProviderError>,
  },
  TopicSearch {
    seq:    u64,
    result: Result<Vec<VerseRef>, ProviderError>,
  },
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub tab:          Tab,
  /// Active text input, if any. Keys go here before anything else.
  pub input:        Option<Input>,
  pub status_msg:   String,
  pub study:        StudyStore,
  /// Topic that the "add to topic" action targets.
  pub active_topic: Option<TopicId>,

  // Read tab
  pub reader:      Reader,
  pub read_cursor: usize,
  /// Verse to put the cursor on once the next reader load lands.
  pending_focus:   Option<VerseKey>,
  startup:         Option<FetchTicket>,

  // Books tab
  pub catalog:       Vec<String>,
  pub book_filter:   String,
  pub books_level:   BooksLevel,
  pub books_cursor:  usize,
  pub book_verses:   Vec<VerseRef>,
  books_gate:        RequestGate,

  // Favorites tab
  pub fav_cursor: usize,

  // Topics tab
  pub topics_view:        TopicsView,
  pub topic_cursor:       usize,
  pub topic_verse_cursor: usize,
  pub candidate_cursor:   usize,
  /// Query behind `topic_search`; empty means "offer favorites".
  pub topic_query:        String,
  pub topic_search:       Vec<VerseRef>,
  topic_gate:             RequestGate,

  source: Arc<Source>,
  repo:   Option<SqliteStore>,
  tx:     UnboundedSender<Fetched>,
}

impl App {
  /// Create an [`App`] reading `book` `chapter`. Nothing is fetched until
  /// [`start`](Self::start).
  pub fn new(
    source: Source,
    repo: Option<SqliteStore>,
    tx: UnboundedSender<Fetched>,
    book: &str,
    chapter: u32,
  ) -> Self {
    let (reader, startup) = Reader::new(book, chapter);
    Self {
      tab: Tab::Read,
      input: None,
      status_msg: String::new(),
      study: StudyStore::new(),
      active_topic: None,
      reader,
      read_cursor: 0,
      pending_focus: None,
      startup: Some(startup),
      catalog: Vec::new(),
      book_filter: String::new(),
      books_level: BooksLevel::Categories,
      books_cursor: 0,
      book_verses: Vec::new(),
      books_gate: RequestGate::new(),
      fav_cursor: 0,
      topics_view: TopicsView::List,
      topic_cursor: 0,
      topic_verse_cursor: 0,
      candidate_cursor: 0,
      topic_query: String::new(),
      topic_search: Vec::new(),
      topic_gate: RequestGate::new(),
      source: Arc::new(source),
      repo,
      tx,
    }
  }

  // ── Startup and fetching ──────────────────────────────────────────────────

  /// Restore saved study data and kick off the catalog and first chapter
  /// loads.
  pub async fn start(&mut self) -> anyhow::Result<()> {
    if let Some(repo) = &self.repo
      && let Some(snapshot) = repo.load().await?
    {
      self.study = StudyStore::from_snapshot(snapshot);
      debug!(
        favorites = self.study.favorites().len(),
        topics = self.study.topics().len(),
        "restored study data"
      );
    }
    self.active_topic = self.study.topics().first().map(|t| t.id);

    let source = Arc::clone(&self.source);
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let books = provider::books_or_empty(&*source).await;
      let _ = tx.send(Fetched::Catalog(books));
    });

    if let Some(ticket) = self.startup.take() {
      self.dispatch(ticket);
    }
    Ok(())
  }

  /// Run a reader ticket in the background.
  fn dispatch(&self, ticket: FetchTicket) {
    let source = Arc::clone(&self.source);
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = ticket.request.run(&*source).await;
      let _ = tx.send(Fetched::Reader { ticket, result });
    });
  }

  fn fetch_book_chapter(&mut self, book: String, chapter: u32) {
    let seq = self.books_gate.issue();
    let source = Arc::clone(&self.source);
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let result = source.fetch_chapter(&book, chapter).await;
      let _ = tx.send(Fetched::BookChapter { seq, result });
    });
  }

  fn search_topic_candidates(&mut self, query: String) {
    self.topic_query = query.trim().to_owned();
    self.candidate_cursor = 0;
    if self.topic_query.is_empty() {
      self.topic_gate.cancel();
      self.topic_search.clear();
      return;
    }
    let seq = self.topic_gate.issue();
    let source = Arc::clone(&self.source);
    let tx = self.tx.clone();
    let query = self.topic_query.clone();
    tokio::spawn(async move {
      let result = source.search(&query).await;
      let _ = tx.send(Fetched::TopicSearch { seq, result });
    });
  }

  /// Apply a finished fetch. Results for superseded requests are dropped.
  pub fn apply(&mut self, fetched: Fetched) {
    match fetched {
      Fetched::Catalog(books) => self.catalog = books,

      Fetched::Reader { ticket, result } => match self.reader.complete(&ticket, result) {
        Completion::Applied => self.focus_after_load(),
        Completion::Failed { error, reload } => {
          self.status_msg = format!("Error: {error}");
          if let Some(ticket) = reload {
            self.dispatch(ticket);
          }
        }
        Completion::Stale => {}
      },

      Fetched::BookChapter { seq, result } => {
        if !self.books_gate.accept(seq) {
          debug!(seq, "discarding stale book chapter");
          return;
        }
        match result {
          Ok(verses) => {
            self.book_verses = verses;
            self.books_cursor = 0;
          }
          Err(err) => self.status_msg = format!("Error: {err}"),
        }
      }

      Fetched::TopicSearch { seq, result } => {
        if !self.topic_gate.accept(seq) {
          debug!(seq, "discarding stale topic search");
          return;
        }
        match result {
          Ok(verses) => {
            self.topic_search = verses;
            self.candidate_cursor = 0;
          }
          Err(err) => self.status_msg = format!("Error: {err}"),
        }
      }
    }
  }

  fn focus_after_load(&mut self) {
    let focus = self.pending_focus.take();
    let target = self.reader.anchor().cloned().or(focus);
    self.read_cursor = target
      .and_then(|key| verse::position_of(self.visible_verses(), &key))
      .unwrap_or(0);
  }

  // ── Derived lists ─────────────────────────────────────────────────────────

  /// The reader's list, or the base list while an expansion is still
  /// loading so the screen never flashes empty.
  pub fn visible_verses(&self) -> &[VerseRef] {
    let displayed = self.reader.displayed();
    if displayed.is_empty() && self.reader.is_loading() {
      self.reader.base_verses()
    } else {
      displayed
    }
  }

  /// Catalog books matching the filter, grouped by testament in canon
  /// order. Books unknown to the canon come last.
  pub fn book_entries(&self) -> Vec<BookEntry<'_>> {
    let matcher = SkimMatcherV2::default();
    let mut entries: Vec<BookEntry> = self
      .catalog
      .iter()
      .filter(|b| self.book_filter.is_empty() || matcher.fuzzy_match(b, &self.book_filter).is_some())
      .map(|b| BookEntry {
        group: canon::lookup(b).map(|c| c.testament),
        name:  b,
      })
      .collect();
    entries.sort_by_key(|e| e.group.map_or(usize::MAX, |t| t as usize));
    entries
  }

  /// Candidates offered by the add panel: search hits, or favorites when no
  /// search was made. Verses already in the topic are left out.
  pub fn candidates(&self) -> Vec<&VerseRef> {
    let TopicsView::AddVerses { id } = self.topics_view else {
      return Vec::new();
    };
    if self.topic_query.is_empty() {
      return self.study.favorites_not_in_topic(id);
    }
    let Some(topic) = self.study.topic(id) else {
      return Vec::new();
    };
    self
      .topic_search
      .iter()
      .filter(|v| !topic.contains(&v.key()))
      .collect()
  }

  /// The verse list of the focused pane, used to resolve verse actions.
  fn pane_verses(&self) -> &[VerseRef] {
    match (&self.tab, &self.topics_view) {
      (Tab::Read, _) => self.visible_verses(),
      (Tab::Books, _) => &self.book_verses,
      (Tab::Favorites, _) => self.study.favorite_verses(),
      (Tab::Topics, TopicsView::Detail { id }) => {
        self.study.topic(*id).map_or(&[], |t| t.verses.as_slice())
      }
      (Tab::Topics, TopicsView::AddVerses { .. }) => &self.topic_search,
      (Tab::Topics, TopicsView::List) => &[],
    }
  }

  /// The verse under the cursor of whichever list has focus.
  pub fn focused_verse(&self) -> Option<&VerseRef> {
    match (&self.tab, &self.books_level, &self.topics_view) {
      (Tab::Read, ..) => self.visible_verses().get(self.read_cursor),
      (Tab::Books, BooksLevel::Verses { .. }, _) => self.book_verses.get(self.books_cursor),
      (Tab::Books, ..) => None,
      (Tab::Favorites, ..) => self.study.favorite_verses().get(self.fav_cursor),
      (Tab::Topics, _, TopicsView::Detail { id }) => self
        .study
        .topic(*id)
        .and_then(|t| t.verses.get(self.topic_verse_cursor)),
      (Tab::Topics, _, TopicsView::AddVerses { .. }) => {
        self.candidates().get(self.candidate_cursor).copied()
      }
      (Tab::Topics, _, TopicsView::List) => None,
    }
  }

  pub fn active_topic_title(&self) -> Option<&str> {
    self
      .active_topic
      .and_then(|id| self.study.topic(id))
      .map(|t| t.title.as_str())
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> bool {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    // Input mode: all printable keys go into the buffer.
    if self.input.is_some() {
      self.handle_input_key(key).await;
      return true;
    }

    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Tab => self.tab = self.tab.offset(1),
      KeyCode::BackTab => self.tab = self.tab.offset(-1),
      KeyCode::Char(c @ '1'..='4') => {
        let index = c as usize - '1' as usize;
        self.tab = Tab::iter().nth(index).unwrap_or(self.tab);
      }
      KeyCode::Char('y') => {
        if let Some(verse) = self.focused_verse() {
          let quote = verse.quote();
          debug!(verse = %verse, "copied quote");
          self.status_msg = format!("Copied: {quote}");
        }
      }
      _ => match self.tab {
        Tab::Read => self.handle_read_key(key).await,
        Tab::Books => self.handle_books_key(key).await,
        Tab::Favorites => self.handle_favorites_key(key).await,
        Tab::Topics => self.handle_topics_key(key).await,
      },
    }
    true
  }

  async fn handle_input_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        if let Some(Input { prompt: Prompt::BookFilter, .. }) = self.input.take() {
          self.book_filter.clear();
          self.books_cursor = 0;
        }
      }
      KeyCode::Enter => {
        if let Some(input) = self.input.take() {
          self.submit_input(input).await;
        }
      }
      KeyCode::Backspace => {
        if let Some(input) = self.input.as_mut() {
          input.buffer.pop();
        }
      }
      KeyCode::Char(c) => {
        if let Some(input) = self.input.as_mut() {
          input.buffer.push(c);
        }
      }
      _ => {}
    }

    // The book filter narrows the list while typing.
    if let Some(Input { prompt: Prompt::BookFilter, buffer }) = &self.input {
      self.book_filter = buffer.clone();
      self.books_cursor = 0;
    }
  }

  async fn submit_input(&mut self, input: Input) {
    match input.prompt {
      Prompt::Search => {
        let ticket = self.reader.submit_search(&input.buffer);
        self.read_cursor = 0;
        self.dispatch(ticket);
      }
      Prompt::BookFilter => self.book_filter = input.buffer,
      Prompt::TopicTitle => {
        if input.buffer.trim().is_empty() {
          self.status_msg = "Topic title must not be empty".into();
          self.input = Some(Input::new(Prompt::TopicTitle));
        } else {
          self.input = Some(Input::new(Prompt::TopicDescription { title: input.buffer }));
        }
      }
      Prompt::TopicDescription { title } => self.create_topic(&title, &input.buffer).await,
      Prompt::TopicSearch => self.search_topic_candidates(input.buffer),
    }
  }

  // ── Read tab ──────────────────────────────────────────────────────────────

  async fn handle_read_key(&mut self, key: KeyEvent) {
    let len = self.visible_verses().len();
    match key.code {
      KeyCode::Down | KeyCode::Char('j') => step(&mut self.read_cursor, len, true),
      KeyCode::Up | KeyCode::Char('k') => step(&mut self.read_cursor, len, false),

      // Expand, move the highlight, or collapse
      KeyCode::Enter | KeyCode::Char('l') => {
        let Some(verse) = self.visible_verses().get(self.read_cursor).cloned() else {
          return;
        };
        let was_expanded = self.reader.anchor().is_some();
        if let Some(ticket) = self.reader.activate(&verse) {
          self.dispatch(ticket);
        }
        if was_expanded && self.reader.anchor().is_none() {
          self.refocus(verse.key());
        } else {
          self.focus_after_load();
        }
      }

      KeyCode::Esc | KeyCode::Char('h') => {
        if let Some(anchor) = self.reader.anchor().cloned() {
          match self.reader.close_expanded() {
            Some(ticket) => {
              self.pending_focus = Some(anchor);
              self.dispatch(ticket);
            }
            None => self.refocus(anchor),
          }
        } else if self.reader.query().is_some() {
          let ticket = self.reader.clear_search();
          self.read_cursor = 0;
          self.dispatch(ticket);
        }
      }

      KeyCode::Char('/') => self.input = Some(Input::new(Prompt::Search)),
      KeyCode::Char('n') | KeyCode::Char(']') => self.step_chapter(true),
      KeyCode::Char('p') | KeyCode::Char('[') => self.step_chapter(false),
      KeyCode::Char('f') => {
        if let Some(key) = self.cursor_key(self.read_cursor) {
          self.toggle_favorite(key).await;
        }
      }
      KeyCode::Char('a') => {
        if let Some(key) = self.cursor_key(self.read_cursor) {
          self.add_to_active_topic(key).await;
        }
      }
      _ => {}
    }
  }

  fn refocus(&mut self, key: VerseKey) {
    self.read_cursor = verse::position_of(self.visible_verses(), &key).unwrap_or(0);
  }

  /// Move to the neighbouring chapter, staying inside the book.
  fn step_chapter(&mut self, forward: bool) {
    let passage = self.reader.passage().clone();
    let last = canon::chapter_count(&passage.book).unwrap_or(u32::MAX);
    let target = if forward {
      passage.chapter.checked_add(1).filter(|c| *c <= last)
    } else {
      passage.chapter.checked_sub(1).filter(|c| *c >= 1)
    };
    match target {
      Some(chapter) => {
        let ticket = self.reader.select_chapter(chapter);
        self.read_cursor = 0;
        self.dispatch(ticket);
      }
      None => {
        let edge = if forward { "last" } else { "first" };
        self.status_msg = format!("{} {} is the {edge} chapter", passage.book, passage.chapter);
      }
    }
  }

  /// Open `verse`'s chapter on the Read tab with the cursor on `verse`.
  fn open_in_reader(&mut self, verse: &VerseRef) {
    let ticket = self.reader.select(verse.book.clone(), verse.chapter);
    self.pending_focus = Some(verse.key());
    self.read_cursor = 0;
    self.tab = Tab::Read;
    self.dispatch(ticket);
  }

  // ── Books tab ─────────────────────────────────────────────────────────────

  async fn handle_books_key(&mut self, key: KeyEvent) {
    match self.books_level.clone() {
      BooksLevel::Categories => {
        let entries = self.book_entries();
        let len = entries.len();
        let selected = entries.get(self.books_cursor).map(|e| e.name.to_owned());
        match key.code {
          KeyCode::Down | KeyCode::Char('j') => step(&mut self.books_cursor, len, true),
          KeyCode::Up | KeyCode::Char('k') => step(&mut self.books_cursor, len, false),
          KeyCode::Char('/') => {
            self.input = Some(Input {
              prompt: Prompt::BookFilter,
              buffer: self.book_filter.clone(),
            });
          }
          KeyCode::Esc => {
            self.book_filter.clear();
            self.books_cursor = 0;
          }
          KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
            if let Some(book) = selected {
              self.books_level = BooksLevel::Chapters { book };
              self.books_cursor = 0;
            }
          }
          _ => {}
        }
      }

      BooksLevel::Chapters { book } => {
        let count = canon::chapter_count(&book).unwrap_or(1) as usize;
        match key.code {
          KeyCode::Down | KeyCode::Char('j') => step(&mut self.books_cursor, count, true),
          KeyCode::Up | KeyCode::Char('k') => step(&mut self.books_cursor, count, false),
          KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
            let chapter = self.books_cursor as u32 + 1;
            self.book_verses.clear();
            self.books_level = BooksLevel::Verses { book: book.clone(), chapter };
            self.books_cursor = 0;
            self.fetch_book_chapter(book, chapter);
          }
          KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => {
            self.books_level = BooksLevel::Categories;
            self.books_cursor = self
              .book_entries()
              .iter()
              .position(|e| e.name == book)
              .unwrap_or(0);
          }
          _ => {}
        }
      }

      BooksLevel::Verses { book, chapter } => {
        let len = self.book_verses.len();
        match key.code {
          KeyCode::Down | KeyCode::Char('j') => step(&mut self.books_cursor, len, true),
          KeyCode::Up | KeyCode::Char('k') => step(&mut self.books_cursor, len, false),
          KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
            if let Some(verse) = self.book_verses.get(self.books_cursor).cloned() {
              self.open_in_reader(&verse);
            }
          }
          KeyCode::Char('f') => {
            if let Some(key) = self.cursor_key(self.books_cursor) {
              self.toggle_favorite(key).await;
            }
          }
          KeyCode::Char('a') => {
            if let Some(key) = self.cursor_key(self.books_cursor) {
              self.add_to_active_topic(key).await;
            }
          }
          KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => {
            self.books_gate.cancel();
            self.book_verses.clear();
            self.books_level = BooksLevel::Chapters { book };
            self.books_cursor = chapter.saturating_sub(1) as usize;
          }
          _ => {}
        }
      }
    }
  }

  // ── Favorites tab ─────────────────────────────────────────────────────────

  async fn handle_favorites_key(&mut self, key: KeyEvent) {
    let len = self.study.favorites().len();
    match key.code {
      KeyCode::Down | KeyCode::Char('j') => step(&mut self.fav_cursor, len, true),
      KeyCode::Up | KeyCode::Char('k') => step(&mut self.fav_cursor, len, false),
      KeyCode::Enter | KeyCode::Char('l') => {
        if let Some(verse) = self.study.favorite_verses().get(self.fav_cursor).cloned() {
          self.open_in_reader(&verse);
        }
      }
      KeyCode::Char('f') | KeyCode::Char('d') | KeyCode::Delete => {
        if let Some(key) = self.cursor_key(self.fav_cursor) {
          self.toggle_favorite(key).await;
          clamp(&mut self.fav_cursor, self.study.favorites().len());
        }
      }
      KeyCode::Char('a') => {
        if let Some(key) = self.cursor_key(self.fav_cursor) {
          self.add_to_active_topic(key).await;
        }
      }
      _ => {}
    }
  }

  // ── Topics tab ────────────────────────────────────────────────────────────

  async fn handle_topics_key(&mut self, key: KeyEvent) {
    match self.topics_view {
      TopicsView::List => {
        let len = self.study.topics().len();
        let selected = self.study.topics().get(self.topic_cursor).map(|t| t.id);
        match key.code {
          KeyCode::Down | KeyCode::Char('j') => step(&mut self.topic_cursor, len, true),
          KeyCode::Up | KeyCode::Char('k') => step(&mut self.topic_cursor, len, false),
          KeyCode::Char('n') => self.input = Some(Input::new(Prompt::TopicTitle)),
          KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(id) = selected {
              self.delete_topic(id).await;
            }
          }
          KeyCode::Char(' ') | KeyCode::Char('s') => {
            if let Some(id) = selected {
              self.active_topic = Some(id);
              if let Some(title) = self.active_topic_title() {
                self.status_msg = format!("Adding verses to \"{title}\"");
              }
            }
          }
          KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
            if let Some(id) = selected {
              self.topics_view = TopicsView::Detail { id };
              self.topic_verse_cursor = 0;
            }
          }
          _ => {}
        }
      }

      TopicsView::Detail { id } => {
        let len = self.study.topic(id).map_or(0, |t| t.verses.len());
        match key.code {
          KeyCode::Down | KeyCode::Char('j') => step(&mut self.topic_verse_cursor, len, true),
          KeyCode::Up | KeyCode::Char('k') => step(&mut self.topic_verse_cursor, len, false),
          KeyCode::Char('d') | KeyCode::Char('x') | KeyCode::Delete => {
            if let Some(key) = self.cursor_key(self.topic_verse_cursor) {
              if self.study.remove_verse_from_topic(id, &key) {
                self.status_msg = format!("Removed {key}");
                self.persist().await;
              }
              let len = self.study.topic(id).map_or(0, |t| t.verses.len());
              clamp(&mut self.topic_verse_cursor, len);
            }
          }
          KeyCode::Char('f') => {
            if let Some(key) = self.cursor_key(self.topic_verse_cursor) {
              self.toggle_favorite(key).await;
            }
          }
          KeyCode::Char('a') | KeyCode::Char('+') => {
            self.topics_view = TopicsView::AddVerses { id };
            self.topic_query.clear();
            self.topic_search.clear();
            self.topic_gate.cancel();
            self.candidate_cursor = 0;
          }
          KeyCode::Enter => {
            let verse = self
              .study
              .topic(id)
              .and_then(|t| t.verses.get(self.topic_verse_cursor).cloned());
            if let Some(verse) = verse {
              self.open_in_reader(&verse);
            }
          }
          KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => {
            self.topics_view = TopicsView::List;
          }
          _ => {}
        }
      }

      TopicsView::AddVerses { id } => {
        let candidates: Vec<VerseKey> = self.candidates().iter().map(|v| v.key()).collect();
        match key.code {
          KeyCode::Down | KeyCode::Char('j') => {
            step(&mut self.candidate_cursor, candidates.len(), true)
          }
          KeyCode::Up | KeyCode::Char('k') => {
            step(&mut self.candidate_cursor, candidates.len(), false)
          }
          KeyCode::Char('/') => self.input = Some(Input::new(Prompt::TopicSearch)),
          KeyCode::Enter => {
            if let Some(key) = candidates.get(self.candidate_cursor).cloned() {
              self.add_to_topic(id, key).await;
              let len = self.candidates().len();
              clamp(&mut self.candidate_cursor, len);
            }
          }
          KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => {
            self.topic_gate.cancel();
            self.topics_view = TopicsView::Detail { id };
          }
          _ => {}
        }
      }
    }
  }

  // ── Store mutations ───────────────────────────────────────────────────────

  fn cursor_key(&self, cursor: usize) -> Option<VerseKey> {
    self.pane_verses().get(cursor).map(VerseRef::key)
  }

  /// Look `key` up in the focused pane, then in the favorites.
  fn resolve(&self, key: &VerseKey) -> Option<VerseRef> {
    let found = self.study.resolve(key, self.pane_verses()).cloned();
    if found.is_none() {
      debug!(verse = %key, "verse not on screen or in favorites; ignoring");
    }
    found
  }

  async fn toggle_favorite(&mut self, key: VerseKey) {
    let Some(verse) = self.resolve(&key) else {
      return;
    };
    self.study.toggle_favorite(verse);
    self.status_msg = if self.study.is_favorite(&key) {
      format!("★ {key}")
    } else {
      format!("Removed {key} from favorites")
    };
    self.persist().await;
  }

  async fn add_to_active_topic(&mut self, key: VerseKey) {
    match self.active_topic {
      Some(id) => self.add_to_topic(id, key).await,
      None => self.status_msg = "No active topic; create one on the Topics tab".into(),
    }
  }

  async fn add_to_topic(&mut self, id: TopicId, key: VerseKey) {
    let Some(verse) = self.resolve(&key) else {
      return;
    };
    let title = self.study.topic(id).map(|t| t.title.clone()).unwrap_or_default();
    if self.study.add_verse_to_topic(id, verse) {
      self.status_msg = format!("Added {key} to \"{title}\"");
      self.persist().await;
    } else {
      self.status_msg = format!("{key} is already in \"{title}\"");
    }
  }

  async fn create_topic(&mut self, title: &str, description: &str) {
    match self.study.create_topic(title, description) {
      Ok(topic) => {
        self.status_msg = format!("Created topic \"{}\"", topic.title);
        if self.active_topic.is_none() {
          self.active_topic = Some(topic.id);
        }
        self.topic_cursor = self.study.topics().len().saturating_sub(1);
        self.persist().await;
      }
      Err(err) if err.is_validation() => {
        self.status_msg = err.to_string();
        self.input = Some(Input::new(Prompt::TopicTitle));
      }
      Err(err) => self.status_msg = format!("Error: {err}"),
    }
  }

  async fn delete_topic(&mut self, id: TopicId) {
    if !self.study.delete_topic(id) {
      return;
    }
    if self.active_topic == Some(id) {
      self.active_topic = self.study.topics().first().map(|t| t.id);
    }
    clamp(&mut self.topic_cursor, self.study.topics().len());
    self.status_msg = "Topic deleted".into();
    self.persist().await;
  }

  /// Save the study store, if a data file was given.
  async fn persist(&mut self) {
    let Some(repo) = &self.repo else {
      return;
    };
    let snapshot = self.study.snapshot();
    if let Err(err) = repo.save(&snapshot).await {
      warn!(error = %err, "failed to save study data");
      self.status_msg = format!("Save failed: {err}");
    }
  }

  pub fn is_expanded(&self) -> bool {
    matches!(self.reader.mode(), DisplayMode::ChapterExpanded { .. })
  }
}

// ─── Cursor helpers ───────────────────────────────────────────────────────────

fn step(cursor: &mut usize, len: usize, down: bool) {
  if down {
    if *cursor + 1 < len {
      *cursor += 1;
    }
  } else if *cursor > 0 {
    *cursor -= 1;
  }
}

fn clamp(cursor: &mut usize, len: usize) { *cursor = (*cursor).min(len.saturating_sub(1)); }
