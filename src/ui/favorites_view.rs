//! Favorites screen rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::App;
use crate::favorites::FavoriteStore;

/// Renders the saved stores
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // List
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Key hints
        ])
        .split(area);

    let block = Block::default()
        .title(format!(" Favorite Stores ({}) ", app.favorites.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if app.favorites.is_empty() {
        let empty = Paragraph::new("No favorite stores yet. Press * on a store to save it.")
            .style(Style::default().fg(Color::Gray))
            .block(block);
        frame.render_widget(empty, chunks[0]);
    } else {
        let items: Vec<ListItem> = app.favorites.iter().map(favorite_item).collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");
        let mut state = ListState::default().with_selected(Some(app.favorites_index));
        frame.render_stateful_widget(list, chunks[0], &mut state);
    }

    let status = app
        .notice
        .as_deref()
        .map(|n| Line::from(Span::styled(n.to_string(), Style::default().fg(Color::Green))))
        .unwrap_or_default();
    frame.render_widget(Paragraph::new(status), chunks[1]);

    render_hints(frame, chunks[2]);
}

fn favorite_item(favorite: &FavoriteStore) -> ListItem<'static> {
    let address = favorite
        .address
        .as_ref()
        .map(|a| a.first_line().to_string())
        .unwrap_or_else(|| "No address available".to_string());
    ListItem::new(vec![
        Line::from(vec![
            Span::styled("★ ", Style::default().fg(Color::Yellow)),
            Span::styled(
                favorite.store_name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            format!("    {}  (saved {})", address, favorite.added_at.format("%d %b %Y")),
            Style::default().fg(Color::Gray),
        )),
    ])
}

fn render_hints(frame: &mut Frame, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
    let hints = Line::from(vec![
        key("↑↓"),
        Span::raw(" Select  "),
        key("Enter"),
        Span::raw(" Details  "),
        key("x"),
        Span::raw(" Remove  "),
        key("Esc"),
        Span::raw(" Back  "),
        key("q"),
        Span::raw(" Quit"),
    ]);
    frame.render_widget(Paragraph::new(hints), area);
}
