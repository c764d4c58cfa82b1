//! Books tab — testament categories, then chapters, then verses.

use lectio_core::canon;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{ListItem, Paragraph},
};

use super::{cursor_list, hint, pane_block, verse_item};
use crate::app::{App, BooksLevel};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  match &app.books_level {
    BooksLevel::Categories => draw_categories(f, area, app),
    BooksLevel::Chapters { book } => draw_chapters(f, area, app, book),
    BooksLevel::Verses { book, chapter } => draw_verses(f, area, app, book, *chapter),
  }
}

fn draw_categories(f: &mut Frame, area: Rect, app: &App) {
  let entries = app.book_entries();
  let title = if app.book_filter.is_empty() {
    format!(" Books ({}) ", entries.len())
  } else {
    format!(" Books ({}/{}) /{} ", entries.len(), app.catalog.len(), app.book_filter)
  };
  let block = pane_block(title);
  let inner = block.inner(area);
  f.render_widget(block, area);

  if entries.is_empty() {
    let text = if app.catalog.is_empty() {
      "No books available."
    } else {
      "No books match the filter."
    };
    hint(f, inner, text);
    return;
  }

  // Each row carries its testament label, dimmed after the first book of a
  // group, so the cursor index maps straight onto `entries`.
  let items: Vec<ListItem> = entries
    .iter()
    .enumerate()
    .map(|(i, entry)| {
      let group = entry.group.map_or("Other".to_string(), |t| t.to_string());
      let first_of_group = i == 0 || entries[i - 1].group != entry.group;
      let label_style = if first_of_group {
        Style::default()
          .fg(Color::Magenta)
          .add_modifier(Modifier::BOLD)
      } else {
        Style::default().fg(Color::Black)
      };
      let chapters = canon::chapter_count(entry.name)
        .map(|c| format!("  {c} ch."))
        .unwrap_or_default();
      ListItem::new(Line::from(vec![
        Span::styled(format!("{group:<16}"), label_style),
        Span::raw(entry.name.to_string()),
        Span::styled(chapters, Style::default().fg(Color::DarkGray)),
      ]))
    })
    .collect();
  cursor_list(f, inner, items, app.books_cursor);
}

fn draw_chapters(f: &mut Frame, area: Rect, app: &App, book: &str) {
  let count = canon::chapter_count(book).unwrap_or(1);
  let block = pane_block(format!(" {book} — {count} chapters "));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let items: Vec<ListItem> = (1..=count)
    .map(|c| ListItem::new(format!("Chapter {c}")))
    .collect();
  cursor_list(f, inner, items, app.books_cursor);
}

fn draw_verses(f: &mut Frame, area: Rect, app: &App, book: &str, chapter: u32) {
  let block = pane_block(format!(" {book} {chapter} "));
  let inner = block.inner(area);
  f.render_widget(block, area);

  if app.book_verses.is_empty() {
    f.render_widget(
      Paragraph::new("No verses loaded for this chapter.")
        .style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let items: Vec<ListItem> = app
    .book_verses
    .iter()
    .map(|v| verse_item(v, app, false))
    .collect();
  cursor_list(f, inner, items, app.books_cursor);
}
