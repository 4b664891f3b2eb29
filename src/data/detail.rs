//! Store detail API client
//!
//! Fetches the full record for one store (opening times, services,
//! departments, linked stores) and validates it into a `StoreDetail`.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use thiserror::Error;

use super::stores::{INCLUDE_PARAMS, STORES_BASE_URL};
use super::{value_to_string, Address, LinkedStore, NamedItem, OpeningTimes, StoreDetail};

/// Errors that can occur when fetching a store detail
#[derive(Debug, Error)]
pub enum DetailError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success HTTP status
    #[error("HTTP {0}")]
    HttpStatus(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse store details: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The response was JSON but not a store record
    #[error("Unexpected store details payload")]
    InvalidPayload,

    /// The base URL cannot carry a store id path segment
    #[error("Invalid store details URL: {0}")]
    InvalidUrl(String),
}

/// Anything that can resolve a store id to its detail payload
#[async_trait]
pub trait DetailSource: Send + Sync {
    /// Fetch the detail record for `store_id`
    async fn fetch_detail(&self, store_id: &str) -> Result<StoreDetail, DetailError>;
}

/// Client for the per-store detail endpoint
#[derive(Debug, Clone)]
pub struct StoreDetailClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl StoreDetailClient {
    /// Create a new StoreDetailClient against the public endpoint
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

    /// Builds `{base}/{store_id}` with the id as a single escaped path segment
    fn detail_url(&self, store_id: &str) -> Result<Url, DetailError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| DetailError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| DetailError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(store_id);
        Ok(url)
    }
}

#[async_trait]
impl DetailSource for StoreDetailClient {
    async fn fetch_detail(&self, store_id: &str) -> Result<StoreDetail, DetailError> {
        let url = self.detail_url(store_id)?;
        tracing::debug!(store_id, "fetching store details");

        let response = self
            .client
            .get(url)
            .query(&[("apikey", self.api_key.as_str()), ("include", INCLUDE_PARAMS)])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DetailError::HttpStatus(response.status().as_u16()));
        }

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)?;
        parse_detail(&body, store_id)
    }
}

/// Validates a raw detail payload into a `StoreDetail`
///
/// Missing ids fall back to the requested id; unusable list entries are
/// dropped rather than failing the whole record.
pub fn parse_detail(body: &Value, requested_id: &str) -> Result<StoreDetail, DetailError> {
    let map = body.as_object().ok_or(DetailError::InvalidPayload)?;
    let field = |key: &str| map.get(key).and_then(value_to_string);

    let id = field("id")
        .or_else(|| field("storeId"))
        .or_else(|| field("name"))
        .unwrap_or_else(|| requested_id.to_string());
    let name = field("storeName")
        .or_else(|| field("name"))
        .unwrap_or_else(|| "Unknown Store".to_string());

    Ok(StoreDetail {
        id,
        name,
        address: map.get("address").and_then(Address::from_value),
        telephone: field("telephone"),
        opening_times: map.get("openingTimes").and_then(OpeningTimes::from_value),
        services: list_items(map, "services").iter().filter_map(NamedItem::from_value).collect(),
        departments: list_items(map, "departments")
            .iter()
            .filter_map(NamedItem::from_value)
            .collect(),
        linked_stores: list_items(map, "linkedStores")
            .iter()
            .filter_map(LinkedStore::from_value)
            .collect(),
    })
}

/// Returns the array stored under `key`, or an empty slice
fn list_items<'a>(map: &'a serde_json::Map<String, Value>, key: &str) -> &'a [Value] {
    map.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}
