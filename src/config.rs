//! Environment configuration
//!
//! API keys and endpoint overrides come from the environment (optionally via
//! a `.env` file). Everything has a default except the Google Maps key,
//! whose absence only surfaces when a postcode search is attempted.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

use crate::cache::LocalStorage;
use crate::data::{GeocodeClient, IpGeolocator, StoreDetailClient, StoreSearchClient};

/// Store API key used when none is configured
const DEFAULT_STORE_API_KEY: &str = "APIKEY";

/// Errors raised while reading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Settings read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub google_maps_api_key: Option<String>,
    pub store_api_key: String,
    pub geocode_url: Option<String>,
    pub stores_url: Option<String>,
    pub geolocate_url: Option<String>,
    /// Overrides the XDG data directory for cache and favorites
    pub data_dir: Option<PathBuf>,
    pub http_timeout_secs: u64,
}

/// Load configuration, reading `.env` first if present
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key))
}

/// Build configuration from an env-var lookup function
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        match optional(var) {
            None => Ok(default),
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            }),
        }
    };

    let http_timeout_secs = parse_u64("STOREFINDER_HTTP_TIMEOUT_SECS", 10)?;
    if http_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "STOREFINDER_HTTP_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(AppConfig {
        google_maps_api_key: optional("GOOGLE_MAPS_API_KEY"),
        store_api_key: optional("MORRISONS_API_KEY")
            .unwrap_or_else(|| DEFAULT_STORE_API_KEY.to_string()),
        geocode_url: optional("STOREFINDER_GEOCODE_URL"),
        stores_url: optional("STOREFINDER_STORES_URL"),
        geolocate_url: optional("STOREFINDER_GEOLOCATE_URL"),
        data_dir: optional("STOREFINDER_DATA_DIR").map(PathBuf::from),
        http_timeout_secs,
    })
}

impl AppConfig {
    /// Shared HTTP client with the configured request timeout
    pub fn http_client(&self) -> reqwest::Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(self.http_timeout_secs))
            .build()
    }

    /// Local storage rooted at the configured or XDG data directory
    pub fn storage(&self) -> Option<LocalStorage> {
        match &self.data_dir {
            Some(dir) => Some(LocalStorage::with_dir(dir.clone())),
            None => LocalStorage::new(),
        }
    }

    pub fn geocode_client(&self, client: Client) -> GeocodeClient {
        let geocoder = GeocodeClient::new(client, self.google_maps_api_key.clone());
        match &self.geocode_url {
            Some(url) => geocoder.with_base_url(url),
            None => geocoder,
        }
    }

    pub fn store_search_client(&self, client: Client) -> StoreSearchClient {
        let stores = StoreSearchClient::new(client, self.store_api_key.clone());
        match &self.stores_url {
            Some(url) => stores.with_base_url(url),
            None => stores,
        }
    }

    pub fn store_detail_client(&self, client: Client) -> StoreDetailClient {
        let details = StoreDetailClient::new(client, self.store_api_key.clone());
        match &self.stores_url {
            Some(url) => details.with_base_url(url),
            None => details,
        }
    }

    /// IP geolocator; `consent` reflects `--allow-location`
    pub fn geolocator(&self, client: Client, consent: bool) -> IpGeolocator {
        let geolocator = IpGeolocator::new(client, consent);
        match &self.geolocate_url {
            Some(url) => geolocator.with_url(url),
            None => geolocator,
        }
    }
}
