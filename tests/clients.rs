//! HTTP client tests against local mock servers

use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storefinder::data::{
    Coordinates, DetailError, DetailSource, GeocodeClient, GeocodeError, SearchParams,
    StoreDetailClient, StoreSearchClient,
};
use storefinder::filter::{candidate_stores, TypeFilter, MAX_RESULTS};
use storefinder::search::{SearchError, StoreSearcher, ValidationError};

fn geocoder(server: &MockServer) -> GeocodeClient {
    GeocodeClient::new(Client::new(), Some("test-key".to_string()))
        .with_base_url(format!("{}/geocode/json", server.uri()))
}

fn store_search(server: &MockServer) -> StoreSearchClient {
    StoreSearchClient::new(Client::new(), "APIKEY").with_base_url(format!("{}/stores", server.uri()))
}

#[tokio::test]
async fn test_geocode_ok_returns_first_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocode/json"))
        .and(query_param("address", "BA1 5NF"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [
                {"geometry": {"location": {"lat": 51.38, "lng": -2.36}}},
                {"geometry": {"location": {"lat": 0.0, "lng": 0.0}}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let coords = geocoder(&server).geocode("BA1 5NF").await.unwrap();

    assert_eq!(coords, Coordinates::new(51.38, -2.36));
}

#[tokio::test]
async fn test_geocode_zero_results_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ZERO_RESULTS",
            "results": []
        })))
        .mount(&server)
        .await;

    let err = geocoder(&server).geocode("ZZ99 9ZZ").await.unwrap_err();

    assert!(matches!(err, GeocodeError::NotFound));
    assert!(err.to_string().contains("Postcode not found"));
}

#[tokio::test]
async fn test_store_search_results_sort_and_cap() {
    let server = MockServer::start().await;
    let stores: Vec<_> = (0..14)
        .map(|i| {
            json!({
                "name": 100 + i,
                "storeName": format!("Store {}", i),
                "storeFormat": "supermarket",
                "category": "supermarket",
                "location": {"latitude": 51.0, "longitude": -2.0},
                "distance": 5000 - i * 100
            })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/stores"))
        .and(query_param("apikey", "APIKEY"))
        .and(query_param("distance", "50000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stores": stores })))
        .expect(1)
        .mount(&server)
        .await;

    let results = store_search(&server)
        .search(Coordinates::new(51.38, -2.36), &SearchParams::default())
        .await
        .unwrap();
    assert_eq!(results.len(), 14);

    let shown = candidate_stores(&results, TypeFilter::default());
    assert_eq!(shown.len(), MAX_RESULTS);
    assert_eq!(shown[0].id, "113");
    assert!(shown
        .windows(2)
        .all(|pair| pair[0].distance <= pair[1].distance));
}

#[tokio::test]
async fn test_detail_not_found_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stores/999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = StoreDetailClient::new(Client::new(), "APIKEY")
        .with_base_url(format!("{}/stores", server.uri()));
    let err = client.fetch_detail("999").await.unwrap_err();

    assert!(matches!(err, DetailError::HttpStatus(404)));
}

#[tokio::test]
async fn test_detail_payload_is_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stores/118"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": 118,
            "storeName": "Bath",
            "services": [{"serviceName": "Rug Doctor"}],
            "departments": ["Pharmacy"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = StoreDetailClient::new(Client::new(), "APIKEY")
        .with_base_url(format!("{}/stores", server.uri()));
    let detail = client.fetch_detail("118").await.unwrap();

    assert_eq!(detail.name, "Bath");
    assert_eq!(detail.services[0].name, "Rug Doctor");
    assert_eq!(detail.departments[0].name, "Pharmacy");
}

#[tokio::test]
async fn test_short_search_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let searcher = StoreSearcher::new(
        geocoder(&server),
        store_search(&server),
        SearchParams::default(),
    );
    let err = searcher.search_postcode("BA").await.unwrap_err();

    assert!(matches!(
        err,
        SearchError::Validation(ValidationError::TooShort)
    ));
}

#[tokio::test]
async fn test_postcode_search_geocodes_then_searches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [{"geometry": {"location": {"lat": 51.38, "lng": -2.36}}}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stores"))
        .and(query_param("lat", "51.38"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": 118, "storeName": "Bath", "latitude": 51.37, "longitude": -2.37}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let searcher = StoreSearcher::new(
        geocoder(&server),
        store_search(&server),
        SearchParams::default(),
    );
    let outcome = searcher.search_postcode("  BA1 5NF ").await.unwrap();

    assert_eq!(outcome.origin, Coordinates::new(51.38, -2.36));
    assert_eq!(outcome.stores.len(), 1);
    assert_eq!(outcome.stores[0].name, "Bath");
}
