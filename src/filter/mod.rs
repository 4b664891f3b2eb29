//! Result filtering pipeline
//!
//! Search results flow through three stages before they are shown:
//! type filter, then sort-and-cap, then the tag filter. The first two only
//! need the summaries; the tag filter needs the per-store detail resolved
//! asynchronously, so the candidate set is computed separately and handed to
//! the detail resolver.

pub mod store_type;
pub mod tags;

pub use store_type::{
    apply_type_filter, is_daily_format, is_main_format, sort_and_cap, TypeFilter, MAX_RESULTS,
};
pub use tags::{
    apply_tag_filter, filter_options, normalize_tag, normalize_words, passes_tag_filter,
    AppliedFilters, DEPARTMENT_FILTERS, FILTER_SECTIONS, POPULAR_FILTERS, SERVICE_FILTERS,
};

use crate::data::{StoreDetail, StoreSummary};

/// Stores that survive the type filter and the distance cap
///
/// These are the stores whose detail must be resolved.
pub fn candidate_stores(stores: &[StoreSummary], type_filter: TypeFilter) -> Vec<StoreSummary> {
    sort_and_cap(apply_type_filter(stores, type_filter))
}

/// Stores to display: candidates that also pass the tag filter
///
/// # Arguments
/// * `stores` - Normalized search results
/// * `type_filter` - Main/daily toggles
/// * `tags` - Applied service/department tags
/// * `detail_of` - Lookup of the resolved detail for a store id
pub fn visible_stores<'d, F>(
    stores: &[StoreSummary],
    type_filter: TypeFilter,
    tags: &AppliedFilters,
    detail_of: F,
) -> Vec<StoreSummary>
where
    F: Fn(&str) -> Option<&'d StoreDetail>,
{
    apply_tag_filter(candidate_stores(stores, type_filter), tags, |store| {
        detail_of(store.id.as_str())
    })
}
