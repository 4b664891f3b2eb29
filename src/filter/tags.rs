//! Service/department tag filter
//!
//! Tags are compared through a compact key: diacritics folded, lowercased,
//! anything non-alphanumeric treated as a separator, then separators removed.
//! "Rug Doctor", "rugDoctor" and "rug-doctor" all become `rugdoctor`.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::data::{NamedItem, StoreDetail};

/// Filters offered in the "Popular Filters" section
pub const POPULAR_FILTERS: &[&str] = &[
    "Morrisons Now",
    "Cafe",
    "Pharmacy",
    "Petrol Station",
    "Timpson",
    "Nutmeg",
];

/// Filters offered in the "Departments" section
pub const DEPARTMENT_FILTERS: &[&str] = &["Pharmacy", "Cafe"];

/// Filters offered in the "Services" section
pub const SERVICE_FILTERS: &[&str] = &[
    "Click & Collect",
    "Amazon Locker",
    "Carpet Cleaning",
    "Car Wash",
    "Fishmonger",
    "Free From",
    "Halal Counter",
    "Opticians",
    "Party Shop",
    "Photo Processing",
    "Petrol Station",
    "Podback Recycling",
    "Rug Doctor",
    "Timpson",
    "Butcher",
    "Disabled Access",
    "Dry Cleaning",
    "Pizza Counter",
    "Bakery",
    "Nutmeg Clothing",
    "Morrisons Now",
];

/// Filter modal sections, in display order
pub const FILTER_SECTIONS: [(&str, &[&str]); 3] = [
    ("Popular Filters", POPULAR_FILTERS),
    ("Departments", DEPARTMENT_FILTERS),
    ("Services", SERVICE_FILTERS),
];

/// Every offered filter as (section, label), in display order
pub fn filter_options() -> Vec<(&'static str, &'static str)> {
    FILTER_SECTIONS
        .iter()
        .flat_map(|(section, labels)| labels.iter().map(move |label| (*section, *label)))
        .collect()
}

/// Human-readable normal form: folded, lowercased, single-spaced words
///
/// camelCase boundaries become word breaks, so `rugDoctor` reads `rug doctor`.
pub fn normalize_words(text: &str) -> String {
    let mut spaced = String::with_capacity(text.len() + 4);
    let mut prev_lower = false;
    // Canonical decomposition splits accented letters from their marks
    for c in text.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_uppercase() && prev_lower {
            spaced.push(' ');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        if c.is_alphanumeric() {
            spaced.extend(c.to_lowercase());
        } else {
            spaced.push(' ');
        }
    }
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compact match key for a tag or service name
pub fn normalize_tag(text: &str) -> String {
    normalize_words(text).replace(' ', "")
}

/// The user's applied tag filters, in the order they were applied
///
/// Tags are deduplicated by compact key; tags that normalize to nothing are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedFilters {
    tags: Vec<String>,
}

impl AppliedFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a tag (by compact key) is applied
    pub fn contains(&self, tag: &str) -> bool {
        let key = normalize_tag(tag);
        self.tags.iter().any(|t| normalize_tag(t) == key)
    }

    /// Adds a tag; returns false if it was already applied or is empty
    pub fn insert(&mut self, tag: &str) -> bool {
        if normalize_tag(tag).is_empty() || self.contains(tag) {
            return false;
        }
        self.tags.push(tag.trim().to_string());
        true
    }

    /// Removes a tag; returns true if it was applied
    pub fn remove(&mut self, tag: &str) -> bool {
        let key = normalize_tag(tag);
        let before = self.tags.len();
        self.tags.retain(|t| normalize_tag(t) != key);
        self.tags.len() != before
    }

    /// Applies the tag if absent, removes it if present
    pub fn toggle(&mut self, tag: &str) {
        if !self.remove(tag) {
            self.insert(tag);
        }
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Applied tags as entered
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Compact keys of the applied tags
    pub fn keys(&self) -> Vec<String> {
        self.tags.iter().map(|t| normalize_tag(t)).collect()
    }
}

impl<'a> FromIterator<&'a str> for AppliedFilters {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut filters = Self::new();
        for tag in iter {
            filters.insert(tag);
        }
        filters
    }
}

/// Whether a named service/department satisfies a compact tag key
fn item_matches(item: &NamedItem, key: &str) -> bool {
    std::iter::once(item.name.as_str())
        .chain(item.display_name.as_deref())
        .map(normalize_tag)
        .any(|candidate| !candidate.is_empty() && candidate.contains(key))
}

/// Whether a store passes every applied tag
///
/// No filters passes everything. Otherwise a store without detail fails, and
/// a store with detail needs, for each tag, one service or department whose
/// key equals or contains the tag key.
pub fn passes_tag_filter(detail: Option<&StoreDetail>, filters: &AppliedFilters) -> bool {
    if filters.is_empty() {
        return true;
    }
    let Some(detail) = detail else {
        return false;
    };
    filters.keys().iter().all(|key| {
        detail
            .services
            .iter()
            .chain(detail.departments.iter())
            .any(|item| item_matches(item, key))
    })
}

/// Keeps items whose detail (looked up by `detail_of`) passes the tag filter
pub fn apply_tag_filter<'d, T, F>(items: Vec<T>, filters: &AppliedFilters, detail_of: F) -> Vec<T>
where
    F: Fn(&T) -> Option<&'d StoreDetail>,
{
    if filters.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| passes_tag_filter(detail_of(item), filters))
        .collect()
}
