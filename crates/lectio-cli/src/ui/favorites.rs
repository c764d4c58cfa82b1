//! Favorites tab.

use ratatui::{Frame, layout::Rect, widgets::ListItem};

use super::{cursor_list, hint, pane_block, verse_item};
use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let favorites = app.study.favorite_verses();
  let block = pane_block(format!(" Favorites ({}) ", favorites.len()));
  let inner = block.inner(area);
  f.render_widget(block, area);

  if favorites.is_empty() {
    hint(f, inner, "No favorites yet. Press f on a verse to add one.");
    return;
  }

  let items: Vec<ListItem> = favorites.iter().map(|v| verse_item(v, app, false)).collect();
  cursor_list(f, inner, items, app.fav_cursor);
}
