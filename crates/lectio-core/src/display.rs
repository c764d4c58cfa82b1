//! Display mode state machine for the verse reader.
//!
//! The [`Reader`] decides which verse list is on screen: a chapter
//! (`Reading`), search results (`Searching`), or the full chapter around one
//! selected verse (`ChapterExpanded`). Transitions that need data return a
//! [`FetchTicket`]; the caller runs the request against a
//! [`VerseProvider`](crate::provider::VerseProvider) without blocking and
//! hands the outcome back through [`Reader::complete`].
//!
//! Every ticket carries a sequence number issued by a [`RequestGate`]. Only
//! the most recently issued ticket is accepted; results of superseded
//! requests are dropped, so a slow response can never overwrite newer state.

use tracing::{debug, warn};

use crate::{
  ProviderError,
  provider::VerseProvider,
  verse::{VerseKey, VerseRef},
};

// ─── Request sequencing ──────────────────────────────────────────────────────

/// Issues monotonically increasing sequence numbers and remembers the one
/// that is currently outstanding.
#[derive(Debug, Clone, Default)]
pub struct RequestGate {
  next:    u64,
  pending: Option<u64>,
}

impl RequestGate {
  pub fn new() -> Self { Self::default() }

  /// Start a new request, superseding any outstanding one.
  pub fn issue(&mut self) -> u64 {
    self.next += 1;
    self.pending = Some(self.next);
    self.next
  }

  /// Accept the response for `seq` if it is the outstanding request. The
  /// gate is then idle until the next [`issue`](Self::issue).
  pub fn accept(&mut self, seq: u64) -> bool {
    if self.pending == Some(seq) {
      self.pending = None;
      true
    } else {
      false
    }
  }

  /// Forget the outstanding request; any response for it becomes stale.
  pub fn cancel(&mut self) { self.pending = None; }

  pub fn is_pending(&self) -> bool { self.pending.is_some() }
}

// ─── Fetch tickets ───────────────────────────────────────────────────────────

/// A provider call the caller has to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
  Chapter { book: String, chapter: u32 },
  Search { query: String },
}

impl FetchRequest {
  /// Run the request against `provider`.
  pub async fn run<P>(&self, provider: &P) -> Result<Vec<VerseRef>, ProviderError>
  where
    P: VerseProvider,
  {
    match self {
      Self::Chapter { book, chapter } => provider.fetch_chapter(book, *chapter).await,
      Self::Search { query } => provider.search(query).await,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
  pub seq:     u64,
  pub request: FetchRequest,
}

/// What [`Reader::complete`] did with a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
  /// The response was current and is now on screen.
  Applied,
  /// The response was current but the provider failed; the previous list is
  /// kept and [`Reader::error`] holds a message for the user.
  ///
  /// `reload` is set when a failed expansion falls back to a base list whose
  /// own load it had superseded. The caller must run it.
  Failed { error: ProviderError, reload: Option<FetchTicket> },
  /// A newer request superseded this one; the response was discarded.
  Stale,
}

// ─── Modes ───────────────────────────────────────────────────────────────────

/// The mode a chapter expansion returns to when it is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseMode {
  Reading,
  Searching,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayMode {
  Reading,
  Searching,
  ChapterExpanded { origin: BaseMode, anchor: VerseKey },
}

impl DisplayMode {
  pub fn base(&self) -> BaseMode {
    match self {
      Self::Reading => BaseMode::Reading,
      Self::Searching => BaseMode::Searching,
      Self::ChapterExpanded { origin, .. } => *origin,
    }
  }

  fn from_base(base: BaseMode) -> Self {
    match base {
      BaseMode::Reading => Self::Reading,
      BaseMode::Searching => Self::Searching,
    }
  }
}

/// The book and chapter last selected for reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
  pub book:    String,
  pub chapter: u32,
}

// ─── Reader ──────────────────────────────────────────────────────────────────

/// Display state for the chapter/search view.
#[derive(Debug, Clone)]
pub struct Reader {
  mode:         DisplayMode,
  passage:      Passage,
  query:        Option<String>,
  /// Chapter or search results, depending on the base mode.
  verses:       Vec<VerseRef>,
  /// Full chapter around the anchor while expanded.
  context:      Vec<VerseRef>,
  /// Which list the outstanding ticket will fill, if any.
  awaiting:     Option<Awaiting>,
  /// Set when an expansion superseded a base-list fetch before it landed.
  base_stale:   bool,
  /// Last anchor whose chapter is in `context`, restored if a move to
  /// another chapter fails.
  shown_anchor: Option<VerseKey>,
  error:        Option<String>,
  gate:         RequestGate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
  Base,
  Context,
}

impl Reader {
  /// Start in `Reading` mode on `book` `chapter`. Returns the ticket for the
  /// initial chapter load.
  pub fn new(book: impl Into<String>, chapter: u32) -> (Self, FetchTicket) {
    let mut reader = Self {
      mode:         DisplayMode::Reading,
      passage:      Passage { book: book.into(), chapter },
      query:        None,
      verses:       Vec::new(),
      context:      Vec::new(),
      awaiting:     None,
      base_stale:   false,
      shown_anchor: None,
      error:        None,
      gate:         RequestGate::new(),
    };
    let ticket = reader.load_passage();
    (reader, ticket)
  }

  // ── Accessors ─────────────────────────────────────────────────────────────

  pub fn mode(&self) -> &DisplayMode { &self.mode }

  pub fn passage(&self) -> &Passage { &self.passage }

  /// The active search query, if the base mode is `Searching`.
  pub fn query(&self) -> Option<&str> { self.query.as_deref() }

  /// The verse list the current mode shows.
  pub fn displayed(&self) -> &[VerseRef] {
    match self.mode {
      DisplayMode::ChapterExpanded { .. } => &self.context,
      _ => &self.verses,
    }
  }

  /// The chapter or search list underneath any expansion.
  pub fn base_verses(&self) -> &[VerseRef] { &self.verses }

  /// The highlighted verse while expanded.
  pub fn anchor(&self) -> Option<&VerseKey> {
    match &self.mode {
      DisplayMode::ChapterExpanded { anchor, .. } => Some(anchor),
      _ => None,
    }
  }

  pub fn is_loading(&self) -> bool { self.gate.is_pending() }

  /// Message for the last provider failure, cleared by the next request.
  pub fn error(&self) -> Option<&str> { self.error.as_deref() }

  // ── Transitions ───────────────────────────────────────────────────────────

  /// Select `book`, starting at chapter 1.
  pub fn select_book(&mut self, book: impl Into<String>) -> FetchTicket {
    self.select(book, 1)
  }

  /// Select another chapter of the current book.
  pub fn select_chapter(&mut self, chapter: u32) -> FetchTicket {
    let book = self.passage.book.clone();
    self.select(book, chapter)
  }

  /// Select `book` `chapter` and enter `Reading`.
  pub fn select(&mut self, book: impl Into<String>, chapter: u32) -> FetchTicket {
    self.passage = Passage { book: book.into(), chapter };
    self.load_passage()
  }

  /// Submit a search. A blank query clears the search instead.
  pub fn submit_search(&mut self, query: &str) -> FetchTicket {
    let query = query.trim();
    if query.is_empty() {
      return self.clear_search();
    }
    self.mode = DisplayMode::Searching;
    self.query = Some(query.to_owned());
    self.context.clear();
    self.issue(
      FetchRequest::Search { query: query.to_owned() },
      Awaiting::Base,
    )
  }

  /// Leave search results and reload the last selected chapter.
  pub fn clear_search(&mut self) -> FetchTicket { self.load_passage() }

  /// React to the user activating `verse` in the displayed list.
  ///
  /// From `Reading`/`Searching` this expands the verse's chapter. Activating
  /// the anchor again collapses back without fetching. Activating another
  /// verse of the loaded context chapter just moves the highlight.
  pub fn activate(&mut self, verse: &VerseRef) -> Option<FetchTicket> {
    match &self.mode {
      DisplayMode::ChapterExpanded { origin, anchor } => {
        if verse.has_key(anchor) {
          return self.close_expanded();
        }
        let origin = *origin;
        let shown = self.context.iter().any(|v| v.has_key(anchor)).then(|| anchor.clone());
        let in_context = self.awaiting != Some(Awaiting::Context)
          && self
            .context
            .first()
            .is_some_and(|v| v.book == verse.book && v.chapter == verse.chapter);
        self.mode = DisplayMode::ChapterExpanded { origin, anchor: verse.key() };
        if in_context {
          None
        } else {
          if shown.is_some() {
            self.shown_anchor = shown;
          }
          Some(self.expand_request(verse))
        }
      }
      mode => {
        let origin = mode.base();
        self.mode = DisplayMode::ChapterExpanded { origin, anchor: verse.key() };
        self.shown_anchor = None;
        Some(self.expand_request(verse))
      }
    }
  }

  /// Return from an expansion to the mode it was opened from.
  ///
  /// The base list is still in memory, so normally nothing is fetched. The
  /// one exception is an expansion opened while the base list was still
  /// loading: that load was superseded and is re-issued here.
  pub fn close_expanded(&mut self) -> Option<FetchTicket> {
    let DisplayMode::ChapterExpanded { origin, .. } = self.mode else {
      return None;
    };
    if self.awaiting == Some(Awaiting::Context) {
      self.gate.cancel();
      self.awaiting = None;
    }
    self.leave_expanded(origin)
  }

  /// Apply the provider's answer to `ticket`.
  pub fn complete(
    &mut self,
    ticket: &FetchTicket,
    result: Result<Vec<VerseRef>, ProviderError>,
  ) -> Completion {
    if !self.gate.accept(ticket.seq) {
      debug!(seq = ticket.seq, "discarding stale fetch result");
      return Completion::Stale;
    }
    let awaiting = self.awaiting.take();
    let shown_anchor = self.shown_anchor.take();
    match result {
      Ok(verses) => {
        match awaiting {
          Some(Awaiting::Context) => self.context = verses,
          _ => self.verses = verses,
        }
        self.error = None;
        Completion::Applied
      }
      Err(err) => {
        warn!(error = %err, request = ?ticket.request, "fetch failed");
        let mut reload = None;
        if awaiting == Some(Awaiting::Context)
          && let DisplayMode::ChapterExpanded { origin, .. } = self.mode
        {
          match shown_anchor {
            // Keep the chapter already on screen highlighted.
            Some(anchor) if !self.context.is_empty() => {
              self.mode = DisplayMode::ChapterExpanded { origin, anchor };
            }
            // Nothing to show the expansion with; fall back to the list below.
            _ if self.context.is_empty() => reload = self.leave_expanded(origin),
            _ => {}
          }
        }
        self.error = Some(err.to_string());
        Completion::Failed { error: err, reload }
      }
    }
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  /// Switch back to `origin`. Re-issues the base load if an expansion
  /// superseded it.
  fn leave_expanded(&mut self, origin: BaseMode) -> Option<FetchTicket> {
    self.mode = DisplayMode::from_base(origin);
    self.context.clear();
    self.shown_anchor = None;
    if !self.base_stale {
      return None;
    }
    let request = match (origin, &self.query) {
      (BaseMode::Searching, Some(query)) => FetchRequest::Search { query: query.clone() },
      _ => FetchRequest::Chapter {
        book:    self.passage.book.clone(),
        chapter: self.passage.chapter,
      },
    };
    Some(self.issue(request, Awaiting::Base))
  }

  fn load_passage(&mut self) -> FetchTicket {
    self.mode = DisplayMode::Reading;
    self.query = None;
    self.context.clear();
    let request = FetchRequest::Chapter {
      book:    self.passage.book.clone(),
      chapter: self.passage.chapter,
    };
    self.issue(request, Awaiting::Base)
  }

  fn expand_request(&mut self, verse: &VerseRef) -> FetchTicket {
    let request = FetchRequest::Chapter {
      book:    verse.book.clone(),
      chapter: verse.chapter,
    };
    self.issue(request, Awaiting::Context)
  }

  fn issue(&mut self, request: FetchRequest, awaiting: Awaiting) -> FetchTicket {
    match awaiting {
      Awaiting::Base => self.base_stale = false,
      Awaiting::Context => {
        if self.awaiting == Some(Awaiting::Base) {
          self.base_stale = true;
        }
      }
    }
    self.error = None;
    self.awaiting = Some(awaiting);
    FetchTicket { seq: self.gate.issue(), request }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn chapter(book: &str, chapter: u32, count: u32) -> Vec<VerseRef> {
    (1..=count)
      .map(|v| VerseRef::new(book, chapter, v, format!("{book} {chapter}:{v}")))
      .collect()
  }

  fn loaded_reader() -> Reader {
    let (mut reader, ticket) = Reader::new("John", 3);
    assert_eq!(
      ticket.request,
      FetchRequest::Chapter { book: "John".into(), chapter: 3 }
    );
    assert_eq!(reader.complete(&ticket, Ok(chapter("John", 3, 5))), Completion::Applied);
    reader
  }

  #[test]
  fn gate_accepts_only_latest() {
    let mut gate = RequestGate::new();
    let first = gate.issue();
    let second = gate.issue();
    assert!(!gate.accept(first));
    assert!(gate.is_pending());
    assert!(gate.accept(second));
    assert!(!gate.is_pending());
    assert!(!gate.accept(second), "a response is accepted once");
  }

  #[test]
  fn select_book_resets_chapter_and_keeps_list_while_loading() {
    let mut reader = loaded_reader();
    let ticket = reader.select_book("Genesis");
    assert_eq!(reader.passage(), &Passage { book: "Genesis".into(), chapter: 1 });
    assert!(reader.is_loading());
    assert_eq!(reader.displayed().len(), 5, "old list stays visible");

    reader.complete(&ticket, Ok(chapter("Genesis", 1, 3)));
    assert!(!reader.is_loading());
    assert_eq!(reader.displayed()[0].book, "Genesis");
  }

  #[test]
  fn late_response_does_not_overwrite_newer_state() {
    let mut reader = loaded_reader();
    let slow = reader.select_chapter(4);
    let fast = reader.select_chapter(5);

    assert_eq!(reader.complete(&fast, Ok(chapter("John", 5, 2))), Completion::Applied);
    assert_eq!(reader.complete(&slow, Ok(chapter("John", 4, 9))), Completion::Stale);
    assert_eq!(reader.displayed().len(), 2);
    assert_eq!(reader.displayed()[0].chapter, 5);
  }

  #[test]
  fn search_and_clear() {
    let mut reader = loaded_reader();
    let ticket = reader.submit_search("  loved ");
    assert_eq!(ticket.request, FetchRequest::Search { query: "loved".into() });
    assert_eq!(reader.mode(), &DisplayMode::Searching);
    assert_eq!(reader.query(), Some("loved"));
    reader.complete(&ticket, Ok(vec![VerseRef::new("John", 3, 16, "loved")]));

    let ticket = reader.clear_search();
    assert_eq!(reader.mode(), &DisplayMode::Reading);
    assert_eq!(reader.query(), None);
    assert_eq!(
      ticket.request,
      FetchRequest::Chapter { book: "John".into(), chapter: 3 }
    );
  }

  #[test]
  fn blank_search_returns_to_reading() {
    let mut reader = loaded_reader();
    reader.submit_search("light");
    let ticket = reader.submit_search("   ");
    assert_eq!(reader.mode(), &DisplayMode::Reading);
    assert!(matches!(ticket.request, FetchRequest::Chapter { .. }));
  }

  #[test]
  fn expand_and_collapse_without_refetch() {
    let mut reader = loaded_reader();
    let verse = reader.displayed()[1].clone();

    let ticket = reader.activate(&verse).expect("expansion fetches the chapter");
    assert_eq!(
      reader.mode(),
      &DisplayMode::ChapterExpanded { origin: BaseMode::Reading, anchor: verse.key() }
    );
    reader.complete(&ticket, Ok(chapter("John", 3, 36)));
    assert_eq!(reader.displayed().len(), 36);
    assert_eq!(reader.anchor(), Some(&verse.key()));

    assert!(reader.activate(&verse).is_none());
    assert_eq!(reader.mode(), &DisplayMode::Reading);
    assert_eq!(reader.displayed().len(), 5);
    assert!(!reader.is_loading());
  }

  #[test]
  fn expanding_from_search_returns_to_search() {
    let mut reader = loaded_reader();
    let ticket = reader.submit_search("shepherd");
    let hit = VerseRef::new("Psalms", 23, 1, "The Lord is my shepherd");
    reader.complete(&ticket, Ok(vec![hit.clone()]));

    let ticket = reader.activate(&hit).unwrap();
    reader.complete(&ticket, Ok(chapter("Psalms", 23, 6)));
    assert!(reader.close_expanded().is_none());
    assert_eq!(reader.mode(), &DisplayMode::Searching);
    assert_eq!(reader.displayed(), &[hit]);
  }

  #[test]
  fn moving_highlight_inside_context_does_not_fetch() {
    let mut reader = loaded_reader();
    let first = reader.displayed()[0].clone();
    let ticket = reader.activate(&first).unwrap();
    reader.complete(&ticket, Ok(chapter("John", 3, 36)));

    let other = reader.displayed()[20].clone();
    assert!(reader.activate(&other).is_none());
    assert_eq!(reader.anchor(), Some(&other.key()));

    let elsewhere = VerseRef::new("Romans", 8, 28, "all things");
    let ticket = reader.activate(&elsewhere).expect("other chapter is fetched");
    assert_eq!(
      ticket.request,
      FetchRequest::Chapter { book: "Romans".into(), chapter: 8 }
    );
    assert_eq!(reader.mode().base(), BaseMode::Reading);
  }

  #[test]
  fn closing_expansion_drops_pending_context() {
    let mut reader = loaded_reader();
    let verse = reader.displayed()[0].clone();
    let ticket = reader.activate(&verse).unwrap();
    assert!(reader.close_expanded().is_none());
    assert!(!reader.is_loading());
    assert_eq!(reader.complete(&ticket, Ok(chapter("John", 3, 36))), Completion::Stale);
    assert_eq!(reader.displayed().len(), 5);
  }

  #[test]
  fn provider_failure_keeps_previous_list() {
    let mut reader = loaded_reader();
    let ticket = reader.select_chapter(99);
    let outcome = reader.complete(&ticket, Err(ProviderError::Timeout));
    assert_eq!(
      outcome,
      Completion::Failed { error: ProviderError::Timeout, reload: None }
    );
    assert_eq!(reader.displayed().len(), 5);
    assert_eq!(reader.error(), Some("request timed out"));

    let ticket = reader.select_chapter(3);
    assert!(reader.error().is_none());
    reader.complete(&ticket, Ok(chapter("John", 3, 5)));
  }

  #[test]
  fn failed_expansion_falls_back_to_origin() {
    let mut reader = loaded_reader();
    let verse = reader.displayed()[0].clone();
    let ticket = reader.activate(&verse).unwrap();
    let outcome = reader.complete(&ticket, Err(ProviderError::Network("offline".into())));
    assert!(matches!(outcome, Completion::Failed { reload: None, .. }));
    assert_eq!(reader.mode(), &DisplayMode::Reading);
    assert_eq!(reader.displayed().len(), 5);
  }

  #[test]
  fn failed_move_to_other_chapter_keeps_shown_anchor() {
    let mut reader = loaded_reader();
    let first = reader.displayed()[0].clone();
    let ticket = reader.activate(&first).unwrap();
    reader.complete(&ticket, Ok(chapter("John", 3, 36)));
    let other = reader.displayed()[15].clone();
    assert!(reader.activate(&other).is_none());

    let elsewhere = VerseRef::new("Romans", 8, 28, "all things");
    let ticket = reader.activate(&elsewhere).unwrap();
    reader.complete(&ticket, Err(ProviderError::Timeout));

    assert_eq!(reader.anchor(), Some(&other.key()));
    assert_eq!(reader.displayed().len(), 36);
    assert!(reader.displayed().iter().any(|v| v.has_key(&other.key())));
  }

  #[test]
  fn expanding_during_base_load_reissues_it_on_close() {
    let mut reader = loaded_reader();
    let verse = reader.displayed()[0].clone();
    let base = reader.select_chapter(4);
    let context = reader.activate(&verse).unwrap();
    assert_eq!(reader.complete(&base, Ok(chapter("John", 4, 54))), Completion::Stale);
    reader.complete(&context, Ok(chapter("John", 3, 36)));

    let reload = reader.close_expanded().expect("superseded chapter load is re-issued");
    assert_eq!(
      reload.request,
      FetchRequest::Chapter { book: "John".into(), chapter: 4 }
    );
    reader.complete(&reload, Ok(chapter("John", 4, 54)));
    assert_eq!(reader.displayed().len(), 54);
  }

  #[test]
  fn failed_expansion_during_base_load_reissues_it() {
    let mut reader = loaded_reader();
    let verse = reader.displayed()[0].clone();
    let base = reader.select_chapter(4);
    let context = reader.activate(&verse).unwrap();
    assert_eq!(reader.complete(&base, Ok(chapter("John", 4, 54))), Completion::Stale);

    let Completion::Failed { error, reload: Some(reload) } =
      reader.complete(&context, Err(ProviderError::Timeout))
    else {
      panic!("superseded chapter load should be re-issued");
    };
    assert_eq!(error, ProviderError::Timeout);
    assert_eq!(reader.mode(), &DisplayMode::Reading);
    assert!(reader.is_loading());
    assert_eq!(
      reload.request,
      FetchRequest::Chapter { book: "John".into(), chapter: 4 }
    );

    reader.complete(&reload, Ok(chapter("John", 4, 54)));
    assert_eq!(reader.passage().chapter, 4);
    assert!(reader.displayed().iter().all(|v| v.chapter == 4));
  }
}
