//! TUI rendering — orchestrates all panes.

pub mod books;
pub mod favorites;
pub mod reader;
pub mod topics;

use chrono::Local;
use lectio_core::verse::VerseRef;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use strum::IntoEnumIterator;

use crate::app::{App, BooksLevel, Tab, TopicsView};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  match app.tab {
    Tab::Read => reader::draw(f, rows[1], app),
    Tab::Books => books::draw(f, rows[1], app),
    Tab::Favorites => favorites::draw(f, rows[1], app),
    Tab::Topics => topics::draw(f, rows[1], app),
  }
  draw_status(f, rows[2], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let mut spans = vec![Span::styled(
    " lectio ",
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  )];

  for (i, tab) in Tab::iter().enumerate() {
    let style = if tab == app.tab {
      Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::Gray)
    };
    spans.push(Span::raw(" "));
    spans.push(Span::styled(format!("{} {tab}", i + 1), style));
  }

  let topic = app
    .active_topic_title()
    .map(|t| format!("topic: {t}  "))
    .unwrap_or_default();
  let right = format!("{topic}{} ", Local::now().format("%Y-%m-%d"));

  // Simple left-right header: pad the middle.
  let left_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
  let pad = (area.width as usize)
    .saturating_sub(left_width)
    .saturating_sub(right.chars().count());
  spans.push(Span::raw(" ".repeat(pad)));
  spans.push(Span::styled(right, Style::default().fg(Color::Gray)));

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(Line::from(spans)), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  // An open prompt takes over the whole bar.
  if let Some(input) = &app.input {
    let line = Line::from(vec![
      Span::styled(
        format!(" {} ", input.prompt.label()),
        Style::default()
          .fg(Color::Black)
          .bg(Color::Yellow)
          .add_modifier(Modifier::BOLD),
      ),
      Span::styled(format!(" {}_", input.buffer), Style::default().fg(Color::Yellow)),
    ]);
    f.render_widget(
      Paragraph::new(line).style(Style::default().bg(Color::Black)),
      area,
    );
    return;
  }

  let (mode_label, hints) = match app.tab {
    Tab::Read if app.is_expanded() => (
      "CHAPTER",
      "↑↓/jk move  Enter highlight  Esc close  f favorite  a add to topic  y copy",
    ),
    Tab::Read if app.reader.query().is_some() => (
      "SEARCH",
      "↑↓/jk move  Enter context  Esc clear  / search  f favorite  a add",
    ),
    Tab::Read => (
      "READ",
      "↑↓/jk move  Enter context  [ ] chapter  / search  f favorite  a add  y copy  q quit",
    ),
    Tab::Books => match app.books_level {
      BooksLevel::Categories => ("BOOKS", "↑↓/jk move  / filter  Enter chapters  Tab next"),
      BooksLevel::Chapters { .. } => ("CHAPTERS", "↑↓/jk move  Enter verses  Esc back"),
      BooksLevel::Verses { .. } => ("VERSES", "Enter read  f favorite  a add  y copy  Esc back"),
    },
    Tab::Favorites => ("FAVORITES", "↑↓/jk move  Enter read  d remove  a add to topic  y copy"),
    Tab::Topics => match app.topics_view {
      TopicsView::List => ("TOPICS", "n new  Enter open  Space make active  d delete"),
      TopicsView::Detail { .. } => ("TOPIC", "a add verses  d remove  Enter read  Esc back"),
      TopicsView::AddVerses { .. } => ("ADD", "/ search  Enter add  Esc done"),
    },
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(
    format!("  {status}"),
    Style::default().fg(Color::DarkGray),
  );

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}

// ─── Shared widgets ───────────────────────────────────────────────────────────

fn pane_block(title: String) -> Block<'static> {
  Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray))
}

fn hint(f: &mut Frame, area: Rect, text: &str) {
  f.render_widget(
    Paragraph::new(text.to_string()).style(Style::default().fg(Color::DarkGray)),
    area,
  );
}

/// One verse as a list row: reference, favorite star, text.
fn verse_item(verse: &VerseRef, app: &App, highlighted: bool) -> ListItem<'static> {
  let star = if app.study.is_favorite(&verse.key()) { "★ " } else { "  " };
  let reference = Style::default()
    .fg(if highlighted { Color::Yellow } else { Color::Cyan })
    .add_modifier(Modifier::BOLD);
  let text = if highlighted {
    Style::default().fg(Color::Yellow)
  } else {
    Style::default()
  };
  ListItem::new(Line::from(vec![
    Span::styled(star, Style::default().fg(Color::Yellow)),
    Span::styled(format!("{:<22}", verse.key().to_string()), reference),
    Span::styled(verse.text.clone(), text),
  ]))
}

/// Render `items` with the cursor row highlighted.
fn cursor_list(f: &mut Frame, area: Rect, items: Vec<ListItem<'_>>, cursor: usize) {
  let mut state = ListState::default();
  state.select((!items.is_empty()).then_some(cursor));
  f.render_stateful_widget(
    List::new(items)
      .highlight_style(
        Style::default()
          .bg(Color::Blue)
          .fg(Color::White)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol(""),
    area,
    &mut state,
  );
}
