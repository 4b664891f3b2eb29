//! Store search API client and summary normalization
//!
//! Fetches stores near a coordinate from the retailer's location API. The
//! response shape is not consistent across API revisions, so every entry is
//! parsed leniently into a `RawStore` and then normalized into a
//! `StoreSummary` with a string id, display name and numeric coordinates.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::{value_to_f64, value_to_string, Address, Coordinates, OpeningTimes, StoreSummary};

/// Base URL for the store location API
pub const STORES_BASE_URL: &str = "https://uat-api.morrisons.com/location/v2/stores";

/// Sub-resources requested alongside store records
pub const INCLUDE_PARAMS: &str = "departments,services,linkedStores";

/// Fallback display name for stores without one
const UNKNOWN_STORE_NAME: &str = "Unknown Store";

/// Errors that can occur when searching for stores
#[derive(Debug, Error)]
pub enum StoreSearchError {
    /// HTTP request failed
    #[error("Failed to fetch stores: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success HTTP status
    #[error("Failed to fetch stores: {0}")]
    HttpStatus(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse store search response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The search origin is not a usable coordinate
    #[error("Invalid coordinates provided")]
    InvalidCoordinates,
}

/// Parameters of a proximity search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    /// Search radius in metres
    pub radius_m: u32,
    /// Maximum number of stores requested from the API
    pub limit: u32,
    /// Optional store-format hint passed to the API (e.g. "supermarket")
    pub store_format: Option<String>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            radius_m: 50_000,
            limit: 10,
            store_format: None,
        }
    }
}

/// A nested latitude/longitude object (`location` or `satnav`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPoint {
    #[serde(default)]
    pub latitude: Option<Value>,
    #[serde(default)]
    pub longitude: Option<Value>,
}

/// A store record exactly as received, with every field optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStore {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub store_id: Option<Value>,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub store_name: Option<Value>,
    #[serde(default)]
    pub store_format: Option<Value>,
    #[serde(default)]
    pub category: Option<Value>,
    #[serde(default)]
    pub latitude: Option<Value>,
    #[serde(default)]
    pub longitude: Option<Value>,
    #[serde(default)]
    pub location: Option<RawPoint>,
    #[serde(default)]
    pub satnav: Option<RawPoint>,
    #[serde(default)]
    pub distance: Option<Value>,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub telephone: Option<Value>,
    #[serde(default)]
    pub opening_times: Option<Value>,
}

impl RawStore {
    /// Resolves one coordinate component: direct field, then `location`, then `satnav`, then zero
    fn coordinate(
        &self,
        direct: &Option<Value>,
        nested: impl Fn(&RawPoint) -> &Option<Value>,
    ) -> f64 {
        direct
            .as_ref()
            .and_then(value_to_f64)
            .or_else(|| {
                self.location
                    .as_ref()
                    .and_then(|p| nested(p).as_ref())
                    .and_then(value_to_f64)
            })
            .or_else(|| {
                self.satnav
                    .as_ref()
                    .and_then(|p| nested(p).as_ref())
                    .and_then(value_to_f64)
            })
            .unwrap_or(0.0)
    }

    /// Normalizes this record into a `StoreSummary`
    ///
    /// Returns `None` when no identifier can be found (`id`, `storeId`, then `name`).
    pub fn normalize(&self) -> Option<StoreSummary> {
        let text = |field: &Option<Value>| field.as_ref().and_then(value_to_string);

        let id = text(&self.id)
            .or_else(|| text(&self.store_id))
            .or_else(|| text(&self.name))?;
        let name = text(&self.store_name)
            .or_else(|| text(&self.name))
            .unwrap_or_else(|| UNKNOWN_STORE_NAME.to_string());
        let format = text(&self.store_format).unwrap_or_default();
        let category = text(&self.category).unwrap_or_else(|| format.clone());

        let coordinates = Coordinates::new(
            self.coordinate(&self.latitude, |p| &p.latitude),
            self.coordinate(&self.longitude, |p| &p.longitude),
        );

        Some(StoreSummary {
            id,
            name,
            category,
            format,
            coordinates,
            distance: self.distance.as_ref().and_then(value_to_f64),
            address: self.address.as_ref().and_then(Address::from_value),
            telephone: text(&self.telephone),
            opening_times: self.opening_times.as_ref().and_then(OpeningTimes::from_value),
        })
    }
}

/// Normalizes raw records, dropping entries without an identifier
pub fn normalize_stores(raw: &[RawStore]) -> Vec<StoreSummary> {
    raw.iter()
        .filter_map(|store| {
            let summary = store.normalize();
            if summary.is_none() {
                tracing::warn!("dropping store record without an identifier");
            }
            summary
        })
        .collect()
}

/// Extracts the store array from any of the known response envelopes
///
/// Accepts a bare array, `{"stores": [...]}` or `{"data": [...]}`. Entries
/// that are not objects are skipped.
pub fn parse_store_list(body: &Value) -> Vec<RawStore> {
    let entries = match body {
        Value::Array(items) => Some(items),
        Value::Object(map) => map
            .get("stores")
            .and_then(Value::as_array)
            .or_else(|| map.get("data").and_then(Value::as_array)),
        _ => None,
    };

    entries
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match serde_json::from_value::<RawStore>(item.clone()) {
                    Ok(store) => Some(store),
                    Err(error) => {
                        tracing::warn!(%error, "skipping malformed store record");
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Client for the proximity store search
#[derive(Debug, Clone)]
pub struct StoreSearchClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl StoreSearchClient {
    /// Create a new StoreSearchClient against the public endpoint
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: STORES_BASE_URL.to_string(),
        }
    }

    /// Override the endpoint (used for tests and proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch stores around `origin`, normalized into summaries
    ///
    /// Ordering is whatever the API returns; callers apply `sort_and_cap`.
    pub async fn search(
        &self,
        origin: Coordinates,
        params: &SearchParams,
    ) -> Result<Vec<StoreSummary>, StoreSearchError> {
        if !origin.is_valid() {
            return Err(StoreSearchError::InvalidCoordinates);
        }

        let mut query: Vec<(&str, String)> = vec![
            ("apikey", self.api_key.clone()),
            ("distance", params.radius_m.to_string()),
            ("lat", origin.lat.to_string()),
            ("lon", origin.lng.to_string()),
            ("limit", params.limit.to_string()),
            ("offset", "0".to_string()),
            ("include", INCLUDE_PARAMS.to_string()),
        ];
        if let Some(format) = &params.store_format {
            query.push(("storeformat", format.clone()));
        }

        tracing::debug!(lat = origin.lat, lng = origin.lng, radius_m = params.radius_m, "searching stores");

        let response = self.client.get(&self.base_url).query(&query).send().await?;
        if !response.status().is_success() {
            return Err(StoreSearchError::HttpStatus(response.status().as_u16()));
        }

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)?;
        let stores = normalize_stores(&parse_store_list(&body));

        tracing::info!(count = stores.len(), "store search complete");
        Ok(stores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawStore {
        serde_json::from_value(value).expect("fixture should parse")
    }

    #[test]
    fn test_normalize_prefers_direct_coordinates() {
        let store = raw(json!({
            "name": 101,
            "storeName": "Bath",
            "latitude": "51.38",
            "longitude": -2.36,
            "location": {"latitude": 1.0, "longitude": 1.0}
        }))
        .normalize()
        .unwrap();

        assert_eq!(store.id, "101");
        assert_eq!(store.name, "Bath");
        assert!((store.coordinates.lat - 51.38).abs() < 1e-9);
        assert!((store.coordinates.lng + 2.36).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_falls_back_to_location_then_satnav() {
        let from_location = raw(json!({
            "id": "5",
            "location": {"latitude": 53.1, "longitude": -1.5},
            "satnav": {"latitude": 0.5, "longitude": 0.5}
        }))
        .normalize()
        .unwrap();
        assert!((from_location.coordinates.lat - 53.1).abs() < 1e-9);

        let from_satnav = raw(json!({
            "id": "6",
            "satnav": {"latitude": 52.0, "longitude": "-0.9"}
        }))
        .normalize()
        .unwrap();
        assert!((from_satnav.coordinates.lat - 52.0).abs() < 1e-9);
        assert!((from_satnav.coordinates.lng + 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_defaults_missing_coordinates_to_zero() {
        let store = raw(json!({"storeId": 7})).normalize().unwrap();

        assert_eq!(store.id, "7");
        assert_eq!(store.name, "Unknown Store");
        assert_eq!(store.coordinates, Coordinates::new(0.0, 0.0));
    }

    #[test]
    fn test_normalize_id_precedence() {
        let store = raw(json!({"id": "a", "storeId": "b", "name": "c"}))
            .normalize()
            .unwrap();
        assert_eq!(store.id, "a");

        assert!(raw(json!({"storeName": "Nameless"})).normalize().is_none());
    }

    #[test]
    fn test_category_falls_back_to_store_format() {
        let store = raw(json!({"id": 1, "storeFormat": "supermarket"}))
            .normalize()
            .unwrap();
        assert_eq!(store.category, "supermarket");
        assert_eq!(store.format, "supermarket");

        let explicit = raw(json!({"id": 2, "storeFormat": "daily", "category": "Convenience"}))
            .normalize()
            .unwrap();
        assert_eq!(explicit.category, "Convenience");
    }

    #[test]
    fn test_normalize_parses_distance_address_and_hours() {
        let store = raw(json!({
            "id": 1,
            "distance": 1609.344,
            "address": {"addressLine1": "Lower Bristol Road", "postcode": "BA2 3EB"},
            "telephone": "01225 000000",
            "openingTimes": {"mon": {"open": "07:00:00", "close": "22:00:00"}}
        }))
        .normalize()
        .unwrap();

        assert_eq!(store.distance, Some(1609.344));
        assert_eq!(
            store.address.as_ref().map(|a| a.first_line()),
            Some("Lower Bristol Road")
        );
        assert_eq!(store.telephone.as_deref(), Some("01225 000000"));
        assert!(store.opening_times.and_then(|t| t.mon).is_some());
    }

    #[test]
    fn test_parse_store_list_envelopes() {
        let bare = json!([{"id": 1}, {"id": 2}]);
        let stores = json!({"stores": [{"id": 1}]});
        let data = json!({"data": [{"id": 1}, {"id": 2}, {"id": 3}]});
        let unknown = json!({"results": [{"id": 1}]});

        assert_eq!(parse_store_list(&bare).len(), 2);
        assert_eq!(parse_store_list(&stores).len(), 1);
        assert_eq!(parse_store_list(&data).len(), 3);
        assert!(parse_store_list(&unknown).is_empty());
    }

    #[test]
    fn test_parse_store_list_skips_non_objects() {
        let body = json!({"stores": [{"id": 1}, "junk", 4]});
        assert_eq!(parse_store_list(&body).len(), 1);
    }

    #[test]
    fn test_normalize_stores_drops_records_without_id() {
        let records = vec![raw(json!({"id": 1})), raw(json!({"storeName": "x"}))];
        let stores = normalize_stores(&records);
        assert_eq!(stores.len(), 1);
    }

    #[test]
    fn test_search_params_default() {
        let params = SearchParams::default();
        assert_eq!(params.radius_m, 50_000);
        assert_eq!(params.limit, 10);
        assert!(params.store_format.is_none());
    }

    #[tokio::test]
    async fn test_search_rejects_invalid_origin() {
        let client = StoreSearchClient::new(Client::new(), "key").with_base_url("http://127.0.0.1:9");

        let err = client
            .search(Coordinates::new(f64::NAN, 0.0), &SearchParams::default())
            .await
            .unwrap_err();

        assert!(matches!(err, StoreSearchError::InvalidCoordinates));
    }
}
