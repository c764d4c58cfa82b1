//! Read tab: the reader's chapter, search results or expanded context.

use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Style},
  widgets::{ListItem, Paragraph},
};

use super::{cursor_list, hint, pane_block, verse_item};
use crate::app::App;

/// Render the Read tab into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let reader = &app.reader;
  let verses = app.visible_verses();

  let mut title = match (reader.anchor(), reader.query()) {
    (Some(anchor), _) => format!(" {} {} (context) ", anchor.book, anchor.chapter),
    (None, Some(query)) => format!(" Search: {query} ({}) ", verses.len()),
    (None, None) => format!(" {} {} ", reader.passage().book, reader.passage().chapter),
  };
  if reader.is_loading() {
    title.push_str("loading… ");
  }

  let block = pane_block(title);
  let mut inner = block.inner(area);
  f.render_widget(block, area);

  // Failure line at the bottom; the last good list stays above it.
  if let Some(error) = reader.error()
    && inner.height > 2
  {
    let error_area = Rect {
      x:      inner.x,
      y:      inner.y + inner.height - 1,
      width:  inner.width,
      height: 1,
    };
    inner.height -= 1;
    f.render_widget(
      Paragraph::new(format!("! {error}")).style(Style::default().fg(Color::Red)),
      error_area,
    );
  }

  if verses.is_empty() {
    let text = if reader.is_loading() {
      "Loading…"
    } else if reader.query().is_some() {
      "No verses match."
    } else {
      "No verses for this chapter."
    };
    hint(f, inner, text);
    return;
  }

  let anchor = reader.anchor();
  let items: Vec<ListItem> = verses
    .iter()
    .map(|v| verse_item(v, app, anchor.is_some_and(|a| v.has_key(a))))
    .collect();
  cursor_list(f, inner, items, app.read_cursor);
}
