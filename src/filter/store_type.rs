//! Store-format classification, type filter and distance ordering

use crate::data::StoreSummary;

/// Maximum number of stores shown after sorting
pub const MAX_RESULTS: usize = 10;

/// Category value marking the convenience format
const DAILY_CATEGORY: &str = "daily";

/// Keyword that marks a convenience store by name or format
const DAILY_KEYWORD: &str = "daily";

/// Category value marking the main supermarket format
const MAIN_CATEGORY: &str = "supermarket";

/// Whether a store is the convenience ("Daily") format
pub fn is_daily_format(store: &StoreSummary) -> bool {
    store.category.eq_ignore_ascii_case(DAILY_CATEGORY)
        || store.name.to_lowercase().contains(DAILY_KEYWORD)
        || store.format.to_lowercase().contains(DAILY_KEYWORD)
}

/// Whether a store is the main supermarket format
pub fn is_main_format(store: &StoreSummary) -> bool {
    store.category.eq_ignore_ascii_case(MAIN_CATEGORY) && !is_daily_format(store)
}

/// The two store-format toggles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeFilter {
    pub main: bool,
    pub daily: bool,
}

impl TypeFilter {
    /// Whether any toggle is on
    pub fn is_active(&self) -> bool {
        self.main || self.daily
    }

    /// Whether a single store passes the toggles
    pub fn matches(&self, store: &StoreSummary) -> bool {
        if !self.is_active() {
            return true;
        }
        (self.main && is_main_format(store)) || (self.daily && is_daily_format(store))
    }
}

/// Keeps stores matching the toggles; neither toggle on keeps everything
pub fn apply_type_filter(stores: &[StoreSummary], filter: TypeFilter) -> Vec<StoreSummary> {
    stores
        .iter()
        .filter(|store| filter.matches(store))
        .cloned()
        .collect()
}

/// Sorts by ascending distance (absent last) and keeps the first `MAX_RESULTS`
///
/// The sort is stable, so ties keep their API order and re-applying this to
/// its own output is a no-op.
pub fn sort_and_cap(mut stores: Vec<StoreSummary>) -> Vec<StoreSummary> {
    stores.sort_by(|a, b| match (a.distance, b.distance) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    stores.truncate(MAX_RESULTS);
    stores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Coordinates;

    fn store(id: &str, name: &str, category: &str, distance: Option<f64>) -> StoreSummary {
        StoreSummary {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            format: String::new(),
            coordinates: Coordinates::new(51.0, -2.0),
            distance,
            address: None,
            telephone: None,
            opening_times: None,
        }
    }

    fn mixed() -> Vec<StoreSummary> {
        vec![
            store("1", "Bath", "supermarket", Some(100.0)),
            store("2", "Bath Daily", "supermarket", Some(200.0)),
            store("3", "Frome", "daily", Some(300.0)),
            store("4", "Petrol", "pfs", Some(400.0)),
        ]
    }

    fn ids(stores: &[StoreSummary]) -> Vec<&str> {
        stores.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_daily_classification() {
        assert!(is_daily_format(&store("1", "Anything", "Daily", None)));
        assert!(is_daily_format(&store("2", "Morrisons Daily Keynsham", "supermarket", None)));

        let mut by_format = store("3", "Keynsham", "", None);
        by_format.format = "MDaily".to_string();
        assert!(is_daily_format(&by_format));

        assert!(!is_daily_format(&store("4", "Bath", "supermarket", None)));
    }

    #[test]
    fn test_main_excludes_daily() {
        assert!(is_main_format(&store("1", "Bath", "supermarket", None)));
        assert!(!is_main_format(&store("2", "Bath Daily", "supermarket", None)));
        assert!(!is_main_format(&store("3", "Garage", "pfs", None)));
    }

    #[test]
    fn test_no_toggle_is_identity() {
        let stores = mixed();
        assert_eq!(apply_type_filter(&stores, TypeFilter::default()), stores);
    }

    #[test]
    fn test_single_toggles() {
        let stores = mixed();
        let main = apply_type_filter(&stores, TypeFilter { main: true, daily: false });
        let daily = apply_type_filter(&stores, TypeFilter { main: false, daily: true });

        assert_eq!(ids(&main), vec!["1"]);
        assert_eq!(ids(&daily), vec!["2", "3"]);
    }

    #[test]
    fn test_both_toggles_union() {
        let stores = mixed();
        let both = apply_type_filter(&stores, TypeFilter { main: true, daily: true });
        assert_eq!(ids(&both), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_sort_puts_missing_distance_last() {
        let stores = vec![
            store("a", "A", "", None),
            store("b", "B", "", Some(5.0)),
            store("c", "C", "", Some(1.0)),
        ];
        assert_eq!(ids(&sort_and_cap(stores)), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_and_cap_limits_and_is_idempotent() {
        let stores: Vec<StoreSummary> = (0..15)
            .map(|i| store(&i.to_string(), "S", "", Some(1000.0 - i as f64)))
            .collect();

        let once = sort_and_cap(stores);
        let twice = sort_and_cap(once.clone());

        assert_eq!(once.len(), MAX_RESULTS);
        assert_eq!(once, twice);
        assert!(once
            .windows(2)
            .all(|w| w[0].distance.unwrap() <= w[1].distance.unwrap()));
    }
}
