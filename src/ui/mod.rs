//! UI rendering module for the store finder
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod favorites_view;
pub mod filter_modal;
pub mod help_overlay;
pub mod search_view;
pub mod store_detail;
pub mod store_list;
pub mod store_map;

pub use favorites_view::render as render_favorites;
pub use filter_modal::render as render_filter_modal;
pub use help_overlay::render as render_help_overlay;
pub use search_view::render as render_search;
pub use store_detail::render as render_store_detail;
pub use store_list::render_store_list;

use ratatui::Frame;

use crate::app::{App, AppState};

/// Renders the current view and any overlay on top of it
pub fn render(frame: &mut Frame, app: &App) {
    match &app.state {
        AppState::Search => render_search(frame, app),
        AppState::Results => render_store_list(frame, app),
        AppState::StoreDetail(store_id) => render_store_detail(frame, app, store_id),
        AppState::Favorites => render_favorites(frame, app),
    }

    if let Some(modal) = &app.filter_modal {
        render_filter_modal(frame, modal);
    }
    if app.show_help {
        render_help_overlay(frame);
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{buffer_text, outcome, store, test_app};
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};
    use tempfile::TempDir;

    #[test]
    fn test_help_overlay_drawn_over_view() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);
        app.show_help = true;
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();

        terminal.draw(|frame| render(frame, &app)).unwrap();

        assert!(buffer_text(&terminal).contains("Keyboard Shortcuts"));
    }

    #[test]
    fn test_favorites_view_from_search() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);
        app.handle_key(KeyEvent::new(KeyCode::Char('f'), KeyModifiers::CONTROL));
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();

        terminal.draw(|frame| render(frame, &app)).unwrap();

        assert!(buffer_text(&terminal).contains("Favorite Stores"));
    }

    #[tokio::test]
    async fn test_results_draw_one_filter_bar_and_one_modal() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);
        app.apply_search_outcome(outcome(vec![store("1", "supermarket", 100.0)]));
        app.tag_filters.insert("Pharmacy");
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();

        terminal.draw(|frame| render(frame, &app)).unwrap();
        let content = buffer_text(&terminal);
        assert_eq!(content.matches("Filters:").count(), 1, "{content}");
        assert_eq!(content.matches("selected)").count(), 0, "{content}");

        app.handle_key(KeyEvent::new(KeyCode::Char('f'), KeyModifiers::NONE));
        terminal.draw(|frame| render(frame, &app)).unwrap();
        let content = buffer_text(&terminal);
        assert_eq!(content.matches("Filters:").count(), 1, "{content}");
        assert_eq!(content.matches("Filters (1 selected)").count(), 1, "{content}");
    }
}
