//! Filter modal
//!
//! Lists every offered service/department filter grouped by section. The
//! checkboxes show the pending selection, which only takes effect when the
//! user applies it.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::FilterModal;
use crate::filter::filter_options;
use crate::ui::help_overlay::centered_rect;

/// Builds the modal body
///
/// # Returns
/// The lines and the index of the line holding the cursor
fn build_lines(modal: &FilterModal) -> (Vec<Line<'static>>, usize) {
    let mut lines = Vec::new();
    let mut cursor_line = 0;
    let mut current_section = "";

    for (index, (section, label)) in filter_options().into_iter().enumerate() {
        if section != current_section {
            if !lines.is_empty() {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(Span::styled(
                section,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )));
            current_section = section;
        }

        let checked = if modal.pending.contains(label) { "[x]" } else { "[ ]" };
        let style = if index == modal.cursor {
            cursor_line = lines.len();
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(format!("  {} {}", checked, label), style)));
    }

    (lines, cursor_line)
}

/// Renders the filter modal on top of the current view
pub fn render(frame: &mut Frame, modal: &FilterModal) {
    let area = centered_rect(44, 24, frame.area());
    frame.render_widget(Clear, area);

    let (lines, cursor_line) = build_lines(modal);
    // Two border rows
    let visible_rows = area.height.saturating_sub(2) as usize;
    let scroll = cursor_line.saturating_sub(visible_rows.saturating_sub(1));

    let block = Block::default()
        .title(format!(" Filters ({} selected) ", modal.pending.len()))
        .title_bottom(" Space toggle  Enter apply  c clear  Esc cancel ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((scroll as u16, 0));
    frame.render_widget(paragraph, area);
}
