//! Store detail screen UI
//!
//! Renders a breadcrumb, address and contact details, opening hours for the
//! week (Monday first, today highlighted), services, departments and linked
//! stores. Content scrolls with `j`/`k`.

use chrono::{Datelike, Local, NaiveDateTime};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::data::hours::{day_hours_label, day_label, store_status, DAY_ORDER};
use crate::data::{NamedItem, StoreDetail};
use crate::resolver::DetailState;

/// Color scheme for the detail view
mod colors {
    use ratatui::style::Color;

    /// Section headers
    pub const HEADER: Color = Color::Cyan;
    /// Primary text
    pub const PRIMARY: Color = Color::White;
    /// Secondary/dimmed text
    pub const SECONDARY: Color = Color::Gray;
    pub const OPEN: Color = Color::Green;
    pub const CLOSED: Color = Color::Red;
    pub const FAVORITE: Color = Color::Yellow;
}

/// Renders the store detail screen
///
/// # Arguments
/// * `frame` - The ratatui frame to render into
/// * `app` - The application state
/// * `store_id` - The ID of the store to display
pub fn render(frame: &mut Frame, app: &App, store_id: &str) {
    render_at(frame, app, store_id, Local::now().naive_local());
}

/// Renders the store detail screen as of `now`
pub fn render_at(frame: &mut Frame, app: &App, store_id: &str, now: NaiveDateTime) {
    let area = frame.area();
    let name = app.store_name(store_id);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Breadcrumb
            Constraint::Min(3),    // Content
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Key hints
        ])
        .split(area);

    render_breadcrumb(frame, app, &name, chunks[0]);

    let title = if app.is_favorite(store_id) {
        format!(" ★ {} ", name)
    } else {
        format!(" {} ", name)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER))
        .title(Span::styled(
            title,
            Style::default()
                .fg(colors::PRIMARY)
                .add_modifier(Modifier::BOLD),
        ));

    let lines = match app.detail_state(store_id) {
        Some(DetailState::Ready(detail)) => build_detail_lines(detail, now),
        Some(DetailState::Failed { message, attempt }) => vec![
            Line::from(Span::styled(
                format!("Could not load store details: {}", message),
                Style::default().fg(colors::CLOSED),
            )),
            Line::from(Span::styled(
                format!("Attempt {}. Press r to retry.", attempt),
                Style::default().fg(colors::SECONDARY),
            )),
        ],
        Some(DetailState::Pending { .. }) | None => vec![Line::from(Span::styled(
            "Loading store details...",
            Style::default().fg(colors::SECONDARY),
        ))],
    };

    let content = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll_offset, 0));
    frame.render_widget(content, chunks[1]);

    let status = app
        .notice
        .as_deref()
        .map(|n| Line::from(Span::styled(n.to_string(), Style::default().fg(colors::OPEN))))
        .unwrap_or_default();
    frame.render_widget(Paragraph::new(status), chunks[2]);

    render_help_text(frame, chunks[3]);
}

fn render_breadcrumb(frame: &mut Frame, app: &App, name: &str, area: Rect) {
    let path = app.current_route().to_path();
    let line = Line::from(vec![
        Span::styled("Store Finder", Style::default().fg(colors::HEADER)),
        Span::styled(" > ", Style::default().fg(colors::SECONDARY)),
        Span::styled(name.to_string(), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("   {}", path),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn section_header(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default()
            .fg(colors::HEADER)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Builds the scrollable body for a resolved store
fn build_detail_lines(detail: &StoreDetail, now: NaiveDateTime) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let opening_times = detail.opening_times.as_ref();

    let status = store_status(opening_times, now);
    let status_color = if status.starts_with("Open") {
        colors::OPEN
    } else {
        colors::CLOSED
    };
    lines.push(Line::from(Span::styled(status, Style::default().fg(status_color))));
    lines.push(Line::from(""));

    lines.push(section_header("Address"));
    let address = detail
        .address
        .as_ref()
        .map(|a| a.one_line())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| "No address available".to_string());
    lines.push(Line::from(format!("  {}", address)));
    if let Some(telephone) = &detail.telephone {
        lines.push(Line::from(vec![
            Span::styled("  Tel: ", Style::default().fg(colors::SECONDARY)),
            Span::raw(telephone.clone()),
        ]));
    }
    lines.push(Line::from(""));

    lines.push(section_header("Opening Hours"));
    let today = now.weekday();
    for day in DAY_ORDER {
        let style = if day == today {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors::SECONDARY)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<11}", day_label(day)), style),
            Span::styled(day_hours_label(opening_times, day), style),
        ]));
    }
    lines.push(Line::from(""));

    lines.push(section_header("Services"));
    lines.extend(item_lines(&detail.services, "No services available"));
    lines.push(Line::from(""));

    lines.push(section_header("Departments"));
    lines.extend(item_lines(&detail.departments, "No departments listed"));

    if !detail.linked_stores.is_empty() {
        lines.push(Line::from(""));
        lines.push(section_header("Linked Stores"));
        for linked in &detail.linked_stores {
            let mut text = format!("  {}", linked.name.as_deref().unwrap_or(&linked.id));
            if let Some(format) = &linked.format {
                text.push_str(&format!(" ({})", format));
            }
            lines.push(Line::from(text));
        }
    }

    lines
}

fn item_lines(items: &[NamedItem], empty: &str) -> Vec<Line<'static>> {
    if items.is_empty() {
        return vec![Line::from(Span::styled(
            format!("  {}", empty),
            Style::default().fg(colors::SECONDARY),
        ))];
    }
    items
        .iter()
        .map(|item| Line::from(format!("  • {}", item.label())))
        .collect()
}

/// Renders help text at the bottom
fn render_help_text(frame: &mut Frame, area: Rect) {
    let help = Line::from(vec![
        Span::styled("↑↓", Style::default().fg(colors::FAVORITE)),
        Span::styled(" Scroll  ", Style::default().fg(colors::SECONDARY)),
        Span::styled("*", Style::default().fg(colors::FAVORITE)),
        Span::styled(" Favorite  ", Style::default().fg(colors::SECONDARY)),
        Span::styled("r", Style::default().fg(colors::FAVORITE)),
        Span::styled(" Retry  ", Style::default().fg(colors::SECONDARY)),
        Span::styled("Esc", Style::default().fg(colors::FAVORITE)),
        Span::styled(" Back  ", Style::default().fg(colors::SECONDARY)),
        Span::styled("q", Style::default().fg(colors::FAVORITE)),
        Span::styled(" Quit", Style::default().fg(colors::SECONDARY)),
    ]);
    frame.render_widget(Paragraph::new(help), area);
}
