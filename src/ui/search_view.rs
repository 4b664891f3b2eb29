//! Search screen rendering
//!
//! A single input box for a postcode or town, with validation and search
//! errors shown underneath.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;

/// Renders the search screen
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // Input
            Constraint::Min(3),    // Messages
            Constraint::Length(1), // Key hints
        ])
        .split(area);

    render_title(frame, chunks[0]);
    render_input(frame, app, chunks[1]);
    render_messages(frame, app, chunks[2]);
    render_hints(frame, chunks[3]);
}

fn render_title(frame: &mut Frame, area: Rect) {
    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            "Store Finder",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Find your nearest store by postcode, town or location",
            Style::default().fg(Color::Gray),
        )),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(title, area);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let border_color = if app.input_error.is_some() {
        Color::Red
    } else {
        Color::Yellow
    };

    let text = if app.input.is_empty() {
        Line::from(Span::styled(
            "Enter a postcode or town",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(vec![
            Span::raw(app.input.clone()),
            Span::styled("█", Style::default().fg(Color::Yellow)),
        ])
    };

    let input = Paragraph::new(text).block(
        Block::default()
            .title(" Postcode or town ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color)),
    );
    frame.render_widget(input, area);
}

fn render_messages(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();

    if let Some(error) = &app.input_error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    if app.loading {
        lines.push(Line::from(Span::styled(
            "Searching...",
            Style::default().fg(Color::Cyan),
        )));
    }
    if let Some(error) = &app.error_message {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    if let Some(notice) = &app.notice {
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Green),
        )));
    }
    if let Some(query) = &app.query {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Tab: back to results for \"{}\"", query.label()),
            Style::default().fg(Color::Gray),
        )));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

fn render_hints(frame: &mut Frame, area: Rect) {
    let hints = Line::from(vec![
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Search  "),
        Span::styled("Ctrl+L", Style::default().fg(Color::Yellow)),
        Span::raw(" Use my location  "),
        Span::styled("Ctrl+F", Style::default().fg(Color::Yellow)),
        Span::raw(" Favorites  "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(" Back/Quit"),
    ]);
    frame.render_widget(Paragraph::new(hints), area);
}
