//! Topics tab: topic list, topic detail and the add-verses panel.

use lectio_core::topic::{Topic, TopicId};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{ListItem, Paragraph, Wrap},
};

use super::{cursor_list, hint, pane_block, verse_item};
use crate::app::{App, TopicsView};

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  match app.topics_view {
    TopicsView::List => draw_list(f, area, app),
    TopicsView::Detail { id } => match app.study.topic(id) {
      Some(topic) => draw_detail(f, area, app, topic),
      None => draw_list(f, area, app),
    },
    TopicsView::AddVerses { id } => draw_add(f, area, app, id),
  }
}

fn draw_list(f: &mut Frame, area: Rect, app: &App) {
  let topics = app.study.topics();
  let block = pane_block(format!(" Topics ({}) ", topics.len()));
  let inner = block.inner(area);
  f.render_widget(block, area);

  if topics.is_empty() {
    hint(f, inner, "No topics yet. Press n to create one.");
    return;
  }

  let items: Vec<ListItem> = topics
    .iter()
    .map(|t| {
      let marker = if app.active_topic == Some(t.id) { "● " } else { "  " };
      ListItem::new(Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Green)),
        Span::styled(t.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
          format!("  {} verses  {}", t.verses.len(), t.created_at.format("%Y-%m-%d")),
          Style::default().fg(Color::DarkGray),
        ),
      ]))
    })
    .collect();
  cursor_list(f, inner, items, app.topic_cursor);
}

fn draw_detail(f: &mut Frame, area: Rect, app: &App, topic: &Topic) {
  let block = pane_block(format!(" {} ", topic.title));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(2), Constraint::Min(0)])
    .split(inner);

  let description = if topic.description.is_empty() {
    "(no description)"
  } else {
    topic.description.as_str()
  };
  f.render_widget(
    Paragraph::new(description.to_string())
      .style(Style::default().fg(Color::Gray))
      .wrap(Wrap { trim: true }),
    rows[0],
  );

  if topic.verses.is_empty() {
    hint(f, rows[1], "No verses yet. Press a to add some.");
    return;
  }
  let items: Vec<ListItem> = topic
    .verses
    .iter()
    .map(|v| verse_item(v, app, false))
    .collect();
  cursor_list(f, rows[1], items, app.topic_verse_cursor);
}

fn draw_add(f: &mut Frame, area: Rect, app: &App, id: TopicId) {
  let title = app.study.topic(id).map(|t| t.title.as_str()).unwrap_or("?");
  let source = if app.topic_query.is_empty() {
    "from favorites".to_string()
  } else {
    format!("matching \"{}\"", app.topic_query)
  };
  let block = pane_block(format!(" Add to {title} — {source} "));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let candidates = app.candidates();
  if candidates.is_empty() {
    let text = if app.topic_query.is_empty() {
      "Every favorite is already in this topic. Press / to search."
    } else {
      "No new verses match."
    };
    hint(f, inner, text);
    return;
  }

  let items: Vec<ListItem> = candidates
    .into_iter()
    .map(|v| verse_item(v, app, false))
    .collect();
  cursor_list(f, inner, items, app.candidate_cursor);
}
