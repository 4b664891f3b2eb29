//! Help overlay showing all keybindings
//!
//! Renders a centered modal overlay with keyboard shortcuts.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Renders the help overlay on top of the current view
pub fn render(frame: &mut Frame) {
    let area = frame.area();

    let overlay_area = centered_rect(54, 26, area);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let lines = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        section("Search"),
        help_line("Enter", "Search postcode or town"),
        help_line("Ctrl+L", "Use my location"),
        help_line("Ctrl+F", "Favorites"),
        Line::from(""),
        section("Results"),
        help_line("↑/k, ↓/j", "Move selection up/down"),
        help_line("Enter", "Open store details"),
        help_line("m / d", "Toggle main / daily stores"),
        help_line("f", "Service and department filters"),
        help_line("c", "Clear all filters"),
        help_line("* / Space", "Add or remove favorite"),
        help_line("v", "Favorites"),
        help_line("l", "Search near my location"),
        help_line("r", "Retry failed store details"),
        help_line("/", "New search"),
        Line::from(""),
        section("Other"),
        help_line("Esc", "Go back / Close"),
        help_line("q", "Quit application"),
        help_line("?", "Toggle this help"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or ? to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, overlay_area);
}

fn section(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

/// Creates a help line with key and description
fn help_line(key: &str, description: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", key), Style::default().fg(Color::Yellow)),
        Span::raw(description.to_string()),
    ])
}

/// Helper function to create a centered rect
pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Length((area.height.saturating_sub(height)) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Length((area.width.saturating_sub(width)) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_help_overlay_renders() {
        let backend = TestBackend::new(80, 30);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal
            .draw(|frame| {
                render(frame);
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content().iter().map(|cell| cell.symbol()).collect();

        assert!(content.contains("Help"), "Should render help title");
        assert!(content.contains("Results"), "Should show results section");
        assert!(content.contains("favorite"), "Should mention favorites");
    }

    #[test]
    fn test_centered_rect_fits_small_area() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered_rect(54, 26, area);
        assert!(rect.width <= area.width);
        assert!(rect.height <= area.height);
    }
}
