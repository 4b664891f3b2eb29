//! Map panel
//!
//! Plots the search origin and the visible stores on a canvas fitted to
//! their bounding box. Stores are labelled with their position in the list;
//! the selected store is highlighted.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Points},
        Block, Borders, Paragraph,
    },
    Frame,
};

use crate::app::App;
use crate::data::hours::distance_miles;
use crate::data::{Coordinates, StoreSummary};

/// Smallest span (degrees) shown, so a single store is not infinitely zoomed
const MIN_SPAN_DEGREES: f64 = 0.01;

/// Fraction of the span added on each side
const PADDING: f64 = 0.1;

/// Longitude and latitude bounds covering every point, padded
///
/// # Returns
/// `([min_lng, max_lng], [min_lat, max_lat])`, or `None` for no valid points
pub fn fit_bounds(points: &[Coordinates]) -> Option<([f64; 2], [f64; 2])> {
    let mut valid = points.iter().filter(|p| p.is_valid());
    let first = valid.next()?;

    let (mut min_lng, mut max_lng, mut min_lat, mut max_lat) =
        (first.lng, first.lng, first.lat, first.lat);
    for p in valid {
        min_lng = min_lng.min(p.lng);
        max_lng = max_lng.max(p.lng);
        min_lat = min_lat.min(p.lat);
        max_lat = max_lat.max(p.lat);
    }

    let pad = |min: f64, max: f64| {
        let span = (max - min).max(MIN_SPAN_DEGREES);
        let centre = (min + max) / 2.0;
        let half = span * (0.5 + PADDING);
        [centre - half, centre + half]
    };

    Some((pad(min_lng, max_lng), pad(min_lat, max_lat)))
}

/// Info lines for the selected store: name, address, miles, telephone
fn info_lines(app: &App, store: &StoreSummary) -> Vec<Line<'static>> {
    let detail = app.detail(&store.id);
    let address = detail
        .and_then(|d| d.address.as_ref())
        .or(store.address.as_ref())
        .map(|a| a.first_line().to_string())
        .unwrap_or_else(|| "No address available".to_string());
    let telephone = detail
        .and_then(|d| d.telephone.clone())
        .or_else(|| store.telephone.clone());

    let mut second = format!("{} miles", distance_miles(store.distance));
    if let Some(telephone) = telephone {
        second.push_str(&format!("  Tel: {}", telephone));
    }

    vec![
        Line::from(Span::styled(
            store.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(address, Style::default().fg(Color::Gray))),
        Line::from(Span::styled(second, Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            "Enter: View Store Details",
            Style::default().fg(Color::Yellow),
        )),
    ]
}

/// Renders the map panel for the visible stores
///
/// The selected store's info lines sit under the canvas.
pub fn render(frame: &mut Frame, app: &App, visible: &[StoreSummary], area: Rect) {
    let selected_store = visible.get(app.selected_index);
    let (map_area, info_area) = match selected_store {
        Some(_) if area.height > 10 => {
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(5), Constraint::Length(4)])
                .split(area);
            (parts[0], Some(parts[1]))
        }
        _ => (area, None),
    };
    if let (Some(store), Some(info_area)) = (selected_store, info_area) {
        frame.render_widget(Paragraph::new(info_lines(app, store)), info_area);
    }
    let area = map_area;

    let block = Block::default()
        .title(" Map ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let mut points: Vec<Coordinates> = visible.iter().map(|s| s.coordinates).collect();
    if let Some(origin) = app.origin {
        points.push(origin);
    }

    let Some((x_bounds, y_bounds)) = fit_bounds(&points) else {
        let empty = Paragraph::new("No locations to show")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    let stores: Vec<(f64, f64)> = visible
        .iter()
        .map(|s| (s.coordinates.lng, s.coordinates.lat))
        .collect();
    let selected = visible
        .get(app.selected_index)
        .map(|s| (s.coordinates.lng, s.coordinates.lat));
    let origin = app.origin.map(|o| (o.lng, o.lat));

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(move |ctx| {
            ctx.draw(&Points {
                coords: &stores,
                color: Color::Red,
            });
            if let Some((x, y)) = origin {
                ctx.print(x, y, Span::styled("◎", Style::default().fg(Color::Blue)));
            }
            ctx.layer();
            for (i, (x, y)) in stores.iter().enumerate() {
                let style = if Some((*x, *y)) == selected {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Red)
                };
                ctx.print(*x, *y, Span::styled(format!("{}", i + 1), style));
            }
        });

    frame.render_widget(canvas, area);
}
