//! Opening-hours and distance display helpers
//!
//! Shared by the result cards, the map info line and the detail view.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};

use super::OpeningTimes;

/// Metres per statute mile
const METERS_PER_MILE: f64 = 1609.344;

/// Weekdays in display order (Monday first)
pub const DAY_ORDER: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Full display label for a weekday
pub fn day_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parses "HH:MM:SS" or "HH:MM"
fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// Formats an API time as a 12-hour clock string
///
/// `"06:00:00"` becomes `"6:00am"`, `"22:30:00"` becomes `"10:30pm"`.
/// Unparseable input is returned unchanged.
pub fn format_time(value: &str) -> String {
    match parse_time(value) {
        Some(time) => time.format("%-I:%M%P").to_string(),
        None => value.to_string(),
    }
}

/// Formats one day's hours for the detail view ("Closed" when absent)
pub fn day_hours_label(opening_times: Option<&OpeningTimes>, day: Weekday) -> String {
    match opening_times.and_then(|t| t.for_weekday(day)) {
        Some(hours) => format!("{} - {}", format_time(&hours.open), format_time(&hours.close)),
        None => "Closed".to_string(),
    }
}

/// Status line shown on result cards
///
/// # Arguments
/// * `opening_times` - Hours reported for the store, if any
/// * `now` - Local wall-clock time used to pick the day and compare hours
///
/// # Returns
/// `Open Today • 6:00am - 10:00pm` while open, `Closed • Opens 7:00am` before
/// or after hours, `Closed today` with no entry for today, and
/// `Hours not available` when the store has no hours at all.
pub fn store_status(opening_times: Option<&OpeningTimes>, now: NaiveDateTime) -> String {
    let Some(times) = opening_times else {
        return "Hours not available".to_string();
    };
    let Some(today) = times.for_weekday(now.weekday()) else {
        return "Closed today".to_string();
    };

    match (parse_time(&today.open), parse_time(&today.close)) {
        (Some(open), Some(close)) if now.time() >= open && now.time() < close => format!(
            "Open Today • {} - {}",
            format_time(&today.open),
            format_time(&today.close)
        ),
        _ => format!("Closed • Opens {}", format_time(&today.open)),
    }
}

/// Converts a distance in metres to miles with two decimals, or "N/A"
pub fn distance_miles(meters: Option<f64>) -> String {
    match meters {
        Some(m) if m.is_finite() => format!("{:.2}", m / METERS_PER_MILE),
        _ => "N/A".to_string(),
    }
}
