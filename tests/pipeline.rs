//! End-to-end behaviour of the result pipeline, detail resolution,
//! favorites and location search

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tempfile::TempDir;
use tokio::sync::Notify;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use storefinder::cache::{LocalStorage, StoreCache};
use storefinder::data::{
    Coordinates, DetailError, DetailSource, GeocodeClient, GeolocationError, GeolocationOptions,
    IpGeolocator, NamedItem, SearchParams, StoreDetail, StoreSearchClient, StoreSummary,
};
use storefinder::favorites::{FavoriteStore, FavoritesChange, FavoritesService};
use storefinder::filter::{
    apply_type_filter, candidate_stores, normalize_tag, visible_stores, AppliedFilters, TypeFilter,
};
use storefinder::resolver::{DetailResolver, DetailState};
use storefinder::search::{SearchError, StoreSearcher};

fn store(id: &str, name: &str, category: &str, distance: f64) -> StoreSummary {
    StoreSummary {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        format: String::new(),
        coordinates: Coordinates::new(51.0, -2.0),
        distance: Some(distance),
        address: None,
        telephone: None,
        opening_times: None,
    }
}

fn detail(id: &str, services: &[&str]) -> StoreDetail {
    StoreDetail {
        id: id.to_string(),
        name: format!("Store {id}"),
        address: None,
        telephone: None,
        opening_times: None,
        services: services
            .iter()
            .map(|s| NamedItem {
                name: s.to_string(),
                display_name: None,
            })
            .collect(),
        departments: Vec::new(),
        linked_stores: Vec::new(),
    }
}

fn mixed_stores() -> Vec<StoreSummary> {
    vec![
        store("1", "Bath", "supermarket", 300.0),
        store("2", "Bath Daily", "supermarket", 100.0),
        store("3", "Keynsham", "daily", 200.0),
        store("4", "Petrol", "pfs", 50.0),
    ]
}

#[test]
fn test_type_filter_neither_toggle_keeps_every_store() {
    let stores = mixed_stores();
    assert_eq!(apply_type_filter(&stores, TypeFilter::default()), stores);
}

#[test]
fn test_type_filter_both_toggles_is_union_of_main_and_daily() {
    let stores = mixed_stores();
    let both = TypeFilter {
        main: true,
        daily: true,
    };

    let ids: Vec<String> = apply_type_filter(&stores, both)
        .into_iter()
        .map(|s| s.id)
        .collect();

    // Petrol-only sites are neither main nor daily
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[test]
fn test_type_filter_main_and_daily_are_disjoint() {
    let stores = mixed_stores();
    let main = apply_type_filter(&stores, TypeFilter { main: true, daily: false });
    let daily = apply_type_filter(&stores, TypeFilter { main: false, daily: true });

    let main_ids: Vec<&str> = main.iter().map(|s| s.id.as_str()).collect();
    let daily_ids: Vec<&str> = daily.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(main_ids, vec!["1"]);
    assert_eq!(daily_ids, vec!["2", "3"]);
}

#[test]
fn test_adding_a_tag_never_grows_the_result() {
    let stores = mixed_stores();
    let details: HashMap<String, StoreDetail> = [
        ("1", detail("1", &["Cafe", "Rug Doctor"])),
        ("2", detail("2", &["Cafe"])),
        ("3", detail("3", &["Rug Doctor"])),
        ("4", detail("4", &[])),
    ]
    .into_iter()
    .map(|(id, d)| (id.to_string(), d))
    .collect();
    let lookup = |id: &str| details.get(id);

    let none = visible_stores(&stores, TypeFilter::default(), &AppliedFilters::new(), lookup);
    let cafe: AppliedFilters = ["Cafe"].into_iter().collect();
    let one = visible_stores(&stores, TypeFilter::default(), &cafe, lookup);
    let both: AppliedFilters = ["Cafe", "rugDoctor"].into_iter().collect();
    let two = visible_stores(&stores, TypeFilter::default(), &both, lookup);

    assert!(one.len() <= none.len());
    assert!(two.len() <= one.len());
    assert!(two.iter().all(|s| one.contains(s)));
    assert_eq!(two.len(), 1);
    assert_eq!(two[0].id, "1");
}

#[test]
fn test_tag_normalization_cases() {
    assert_eq!(normalize_tag("Rug Doctor"), "rugdoctor");
    assert_eq!(normalize_tag("rugDoctor"), "rugdoctor");
    assert_eq!(normalize_tag("CAFÉ"), "cafe");
    assert_eq!(normalize_tag("Click & Collect"), "clickcollect");
    assert_eq!(normalize_tag("Podback-Recycling"), "podbackrecycling");
}

/// Detail source whose answers are released by the test
struct GatedSource {
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl GatedSource {
    fn new(ids: &[&str]) -> Self {
        Self {
            gates: Mutex::new(
                ids.iter()
                    .map(|id| (id.to_string(), Arc::new(Notify::new())))
                    .collect(),
            ),
        }
    }

    fn release(&self, id: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(id) {
            gate.notify_one();
        }
    }
}

#[async_trait]
impl DetailSource for GatedSource {
    async fn fetch_detail(&self, store_id: &str) -> Result<StoreDetail, DetailError> {
        let gate = self.gates.lock().unwrap().get(store_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(detail(store_id, &["Cafe"]))
    }
}

#[tokio::test]
async fn test_focus_discards_other_in_flight_details() {
    let source = Arc::new(GatedSource::new(&["1", "2", "3"]));
    let mut resolver = DetailResolver::new(source.clone(), None);
    let stores = vec![
        store("1", "A", "supermarket", 100.0),
        store("2", "B", "supermarket", 200.0),
        store("3", "C", "supermarket", 300.0),
    ];

    assert_eq!(resolver.resolve_missing(&stores), 3);
    resolver.focus("3");

    // Late answers for the abandoned fetches must not land
    source.release("1");
    source.release("2");
    source.release("3");
    while resolver.pending_count() > 0 {
        resolver.wait_next().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    resolver.drain();

    assert!(matches!(resolver.state("3"), Some(DetailState::Ready(_))));
    assert!(resolver.state("1").is_none());
    assert!(resolver.state("2").is_none());
}

#[tokio::test]
async fn test_resolved_details_are_cached() {
    let temp_dir = TempDir::new().unwrap();
    let cache = StoreCache::new(LocalStorage::with_dir(temp_dir.path().to_path_buf()));
    let source = Arc::new(GatedSource::new(&[]));
    let stores = vec![store("9", "Leeds", "supermarket", 10.0)];

    let mut resolver = DetailResolver::new(source.clone(), Some(cache.clone()));
    resolver.resolve_missing(&stores);
    while resolver.pending_count() > 0 {
        resolver.wait_next().await;
    }
    assert!(cache.get("9").is_some());

    // A fresh resolver is served from the cache without fetching
    let mut second = DetailResolver::new(source, Some(cache));
    assert_eq!(second.resolve_missing(&stores), 0);
    assert!(second.detail("9").is_some());
}

#[test]
fn test_favorites_toggle_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    let storage = LocalStorage::with_dir(temp_dir.path().to_path_buf());
    let service = FavoritesService::new(storage.clone());
    let mut changes = service.subscribe();

    let bath = store("118", "Bath", "supermarket", 100.0);
    assert!(service.toggle(FavoriteStore::from_summary(&bath)));
    assert!(service.is_favorite("118"));
    assert_eq!(
        changes.try_recv().unwrap(),
        FavoritesChange::Added("118".to_string())
    );

    // A second service over the same storage sees the saved store
    let reloaded = FavoritesService::new(storage);
    let saved = reloaded.get_all();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].store_name, "Bath");

    assert!(!service.toggle(FavoriteStore::from_summary(&bath)));
    assert!(reloaded.get_all().is_empty());
}

#[tokio::test]
async fn test_denied_location_issues_no_store_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = Client::new();
    let searcher = StoreSearcher::new(
        GeocodeClient::new(client.clone(), Some("key".to_string())).with_base_url(server.uri()),
        StoreSearchClient::new(client.clone(), "APIKEY").with_base_url(server.uri()),
        SearchParams::default(),
    );
    let geolocator = IpGeolocator::new(client, false).with_url(server.uri());

    let err = searcher
        .search_location(&geolocator, &GeolocationOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SearchError::Geolocation(GeolocationError::PermissionDenied)
    ));
}

#[test]
fn test_candidates_drop_stores_beyond_cap() {
    let stores: Vec<StoreSummary> = (0..15)
        .map(|i| store(&i.to_string(), "S", "supermarket", i as f64))
        .collect();
    let candidates = candidate_stores(&stores, TypeFilter::default());
    assert_eq!(candidates.len(), 10);
    assert_eq!(candidates.last().map(|s| s.id.as_str()), Some("9"));
}
