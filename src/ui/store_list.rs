//! Results screen rendering
//!
//! Renders the filter bar, the store cards and the map side by side. The
//! cards show name, first address line, distance in miles and today's
//! opening status.

use chrono::{Local, NaiveDateTime};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::data::hours::{distance_miles, store_status};
use crate::data::StoreSummary;
use crate::ui::store_map;

/// Height of one store card in rows
const CARD_HEIGHT: u16 = 3;

/// Renders the results screen
///
/// # Arguments
/// * `frame` - The ratatui frame to render into
/// * `app` - The application state
pub fn render_store_list(frame: &mut Frame, app: &App) {
    render_store_list_at(frame, app, Local::now().naive_local());
}

/// Renders the results screen with opening status computed for `now`
pub fn render_store_list_at(frame: &mut Frame, app: &App, now: NaiveDateTime) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(1), // Filter bar
            Constraint::Min(5),    // List + map
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Key hints
        ])
        .split(area);

    let visible = app.visible_stores();

    render_header(frame, app, chunks[0]);
    render_filter_bar(frame, app, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[2]);

    render_cards(frame, app, &visible, body[0], now);
    store_map::render(frame, app, &visible, body[1]);

    render_status_line(frame, app, chunks[3]);
    render_hints(frame, chunks[4]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let label = app
        .query
        .as_ref()
        .map(|q| q.label())
        .unwrap_or_default();

    let mut spans = vec![
        Span::styled(
            "Store Finder",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  Stores near \"{}\"", label)),
    ];
    if app.loading {
        spans.push(Span::styled("  Searching...", Style::default().fg(Color::Yellow)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// One-line summary of the active filters
fn render_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let toggle = |on: bool, label: &str| {
        let (mark, color) = if on {
            ("[x] ", Color::Green)
        } else {
            ("[ ] ", Color::Gray)
        };
        Span::styled(format!("{mark}{label}  "), Style::default().fg(color))
    };

    let mut spans = vec![
        toggle(app.type_filter.main, "Main stores (m)"),
        toggle(app.type_filter.daily, "Daily stores (d)"),
    ];

    if app.tag_filters.is_empty() {
        spans.push(Span::styled(
            "No service filters (f)",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        spans.push(Span::raw("Filters: "));
        for (i, tag) in app.tag_filters.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(", "));
            }
            spans.push(Span::styled(tag.to_string(), Style::default().fg(Color::Cyan)));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_cards(
    frame: &mut Frame,
    app: &App,
    visible: &[StoreSummary],
    area: Rect,
    now: NaiveDateTime,
) {
    let block = Block::default()
        .title(format!(" {} stores ", visible.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if visible.is_empty() {
        let message = Paragraph::new(empty_message(app))
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: true });
        frame.render_widget(message, inner);
        return;
    }

    // Keep the selected card on screen
    let per_page = (inner.height / CARD_HEIGHT).max(1) as usize;
    let first = app.selected_index.saturating_sub(per_page - 1);

    for (row, (index, store)) in visible
        .iter()
        .enumerate()
        .skip(first)
        .take(per_page)
        .enumerate()
    {
        let card_area = Rect {
            x: inner.x,
            y: inner.y + row as u16 * CARD_HEIGHT,
            width: inner.width,
            height: CARD_HEIGHT.min(inner.height.saturating_sub(row as u16 * CARD_HEIGHT)),
        };
        let selected = index == app.selected_index;
        frame.render_widget(Paragraph::new(card_lines(app, store, selected, now)), card_area);
    }
}

/// Message shown when no store passes the filters
fn empty_message(app: &App) -> String {
    if let Some(error) = &app.error_message {
        return error.clone();
    }
    if app.loading {
        return "Searching...".to_string();
    }
    if !app.tag_filters.is_empty() && app.pending_details() > 0 {
        return "Loading store details...".to_string();
    }
    let label = app.query.as_ref().map(|q| q.label()).unwrap_or_default();
    format!(
        "No stores found for \"{}\"\nTry a different postcode or town, or clear your filters (c).",
        label
    )
}

fn card_lines(app: &App, store: &StoreSummary, selected: bool, now: NaiveDateTime) -> Vec<Line<'static>> {
    let name_style = if selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let marker = if selected { "▶ " } else { "  " };
    let star = if app.is_favorite(&store.id) { "★ " } else { "" };

    let detail = app.detail(&store.id);
    let address = detail
        .and_then(|d| d.address.as_ref())
        .or(store.address.as_ref())
        .map(|a| a.first_line().to_string())
        .unwrap_or_else(|| "No address available".to_string());
    let opening_times = detail
        .and_then(|d| d.opening_times.as_ref())
        .or(store.opening_times.as_ref());
    let status = store_status(opening_times, now);
    let status_color = if status.starts_with("Open") {
        Color::Green
    } else {
        Color::Red
    };

    vec![
        Line::from(vec![
            Span::raw(marker),
            Span::styled(star, Style::default().fg(Color::Yellow)),
            Span::styled(store.name.clone(), name_style),
            Span::styled(
                format!("  {} miles", distance_miles(store.distance)),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::from(vec![
            Span::raw("    "),
            Span::styled(address, Style::default().fg(Color::Gray)),
        ]),
        Line::from(vec![
            Span::raw("    "),
            Span::styled(status, Style::default().fg(status_color)),
        ]),
    ]
}

fn render_status_line(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(error) = &app.error_message {
        Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red)))
    } else if let Some(notice) = &app.notice {
        Line::from(Span::styled(notice.clone(), Style::default().fg(Color::Green)))
    } else if app.pending_details() > 0 {
        Line::from(Span::styled(
            format!("Loading details for {} stores...", app.pending_details()),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from("")
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_hints(frame: &mut Frame, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));
    let hints = Line::from(vec![
        key("↑↓"),
        Span::raw(" Select  "),
        key("Enter"),
        Span::raw(" Details  "),
        key("f"),
        Span::raw(" Filters  "),
        key("*"),
        Span::raw(" Favorite  "),
        key("/"),
        Span::raw(" Search  "),
        key("?"),
        Span::raw(" Help  "),
        key("q"),
        Span::raw(" Quit"),
    ]);
    frame.render_widget(Paragraph::new(hints), area);
}
