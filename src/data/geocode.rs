//! Google Geocoding API client
//!
//! Resolves free-text postcodes and place names to coordinates. Results are
//! restricted to Great Britain.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use super::Coordinates;

/// Base URL for the Google Geocoding API
const GEOCODE_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Country restriction applied to every lookup
const COMPONENTS: &str = "country:GB";

/// Status values reported by the geocoding service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeocodeStatus {
    Ok,
    ZeroResults,
    InvalidRequest,
    /// Any other status, carried verbatim (OVER_QUERY_LIMIT, REQUEST_DENIED, ...)
    Other(String),
}

impl GeocodeStatus {
    /// Parses the status string from a geocoding response
    pub fn parse(status: &str) -> Self {
        match status {
            "OK" => GeocodeStatus::Ok,
            "ZERO_RESULTS" => GeocodeStatus::ZeroResults,
            "INVALID_REQUEST" => GeocodeStatus::InvalidRequest,
            other => GeocodeStatus::Other(other.to_string()),
        }
    }
}

/// Errors that can occur when geocoding a search string
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// No API key was configured
    #[error("Google Maps API key is not configured")]
    MissingApiKey,

    /// HTTP request failed
    #[error("Geocoding request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The service answered with a non-success HTTP status
    #[error("Geocoding API failed with status: {0}")]
    HttpStatus(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse geocoding response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The postcode or place could not be found
    #[error("Postcode not found. Please check and try again.")]
    NotFound,

    /// The service rejected the input
    #[error("Invalid postcode format.")]
    InvalidFormat,

    /// Any other service-side failure
    #[error("{0}")]
    Service(String),
}

/// Geocoding API response
#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Client for resolving search text to coordinates
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeocodeClient {
    /// Create a new GeocodeClient using the public Google endpoint
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            base_url: GEOCODE_BASE_URL.to_string(),
        }
    }

    /// Override the endpoint (used for tests and proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resolve a postcode or place name to coordinates
    ///
    /// # Returns
    /// * `Ok(Coordinates)` - Location of the first match
    /// * `Err(GeocodeError)` - Missing key, transport failure, or a non-OK status
    pub async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(GeocodeError::MissingApiKey)?;

        tracing::debug!(address, "geocoding search text");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("address", address),
                ("key", api_key),
                ("components", COMPONENTS),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodeError::HttpStatus(response.status().as_u16()));
        }

        let text = response.text().await?;
        let body: GeocodeResponse = serde_json::from_str(&text)?;

        interpret_response(body)
    }
}

/// Maps a geocoding response onto coordinates or a status-specific error
pub(crate) fn interpret_response(response: GeocodeResponse) -> Result<Coordinates, GeocodeError> {
    match GeocodeStatus::parse(&response.status) {
        GeocodeStatus::ZeroResults => Err(GeocodeError::NotFound),
        GeocodeStatus::InvalidRequest => Err(GeocodeError::InvalidFormat),
        GeocodeStatus::Ok => response
            .results
            .first()
            .map(|r| Coordinates::new(r.geometry.location.lat, r.geometry.location.lng))
            .ok_or_else(|| GeocodeError::Service("Unable to geocode the postcode.".to_string())),
        GeocodeStatus::Other(status) => {
            tracing::warn!(status, "geocoding service error");
            Err(GeocodeError::Service(response.error_message.unwrap_or_else(
                || "Unable to geocode the postcode.".to_string(),
            )))
        }
    }
}
