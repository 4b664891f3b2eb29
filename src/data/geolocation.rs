//! Current-position lookup
//!
//! A `Geolocator` answers "where am I?" with coordinates or a classified
//! error. The default implementation asks an IP geolocation service, and only
//! after the user has consented (`--allow-location`); without consent the
//! request is treated as a permission denial. Every lookup is bounded by the
//! timeout in `GeolocationOptions`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use super::Coordinates;

/// Default IP geolocation endpoint
pub const IP_GEOLOCATION_URL: &str = "http://ip-api.com/json/";

/// Classified geolocation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    /// The user has not allowed location access
    #[error("Location permission denied. Please enable location access.")]
    PermissionDenied,

    /// The position could not be determined
    #[error("Location unavailable. Please try again.")]
    PositionUnavailable,

    /// The lookup did not finish within the configured timeout
    #[error("Location request timed out. Please try again.")]
    Timeout,
}

/// Accuracy/timeout/freshness configuration for a position request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached position that may be reused (zero = always fresh)
    pub maximum_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

/// Source of the user's current position
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<Coordinates, GeolocationError>;
}

/// Requests the current position, failing with `Timeout` after `options.timeout`
pub async fn locate_with_timeout(
    geolocator: &dyn Geolocator,
    options: &GeolocationOptions,
) -> Result<Coordinates, GeolocationError> {
    match tokio::time::timeout(options.timeout, geolocator.current_position(options)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_ms = options.timeout.as_millis() as u64, "geolocation timed out");
            Err(GeolocationError::Timeout)
        }
    }
}

/// Response from the IP geolocation service
#[derive(Debug, Deserialize)]
struct IpLocationResponse {
    status: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    message: Option<String>,
}

/// Geolocator backed by an IP geolocation HTTP service
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    client: Client,
    url: String,
    consent: bool,
}

impl IpGeolocator {
    /// Create a new IpGeolocator; `consent` mirrors the browser permission prompt
    pub fn new(client: Client, consent: bool) -> Self {
        Self {
            client,
            url: IP_GEOLOCATION_URL.to_string(),
            consent,
        }
    }

    /// Override the endpoint (used for tests)
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn current_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<Coordinates, GeolocationError> {
        if !self.consent {
            return Err(GeolocationError::PermissionDenied);
        }

        let response = self.client.get(&self.url).send().await.map_err(|error| {
            tracing::warn!(%error, "geolocation request failed");
            GeolocationError::PositionUnavailable
        })?;

        let body: IpLocationResponse = response.json().await.map_err(|error| {
            tracing::warn!(%error, "geolocation response unreadable");
            GeolocationError::PositionUnavailable
        })?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(lat), Some(lon)) => {
                let coords = Coordinates::new(lat, lon);
                if coords.is_valid() {
                    Ok(coords)
                } else {
                    Err(GeolocationError::PositionUnavailable)
                }
            }
            _ => {
                tracing::warn!(status = %body.status, message = ?body.message, "geolocation failed");
                Err(GeolocationError::PositionUnavailable)
            }
        }
    }
}

/// Geolocator that always reports a fixed position (`--here`)
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub Coordinates);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}
