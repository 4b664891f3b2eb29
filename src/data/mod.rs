//! Core data models for the store finder
//!
//! This module contains the domain types shared by the API clients, the
//! filter pipeline and the UI: coordinates, store summaries returned by the
//! proximity search, and the full store detail payload.

pub mod detail;
pub mod geocode;
pub mod geolocation;
pub mod hours;
pub mod stores;

pub use detail::{DetailError, DetailSource, StoreDetailClient};
pub use geocode::{GeocodeClient, GeocodeError, GeocodeStatus};
pub use geolocation::{
    locate_with_timeout, FixedGeolocator, GeolocationError, GeolocationOptions, Geolocator,
    IpGeolocator,
};
pub use stores::{normalize_stores, RawStore, SearchParams, StoreSearchClient, StoreSearchError};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude coordinate
    pub lat: f64,
    /// Longitude coordinate
    pub lng: f64,
}

impl Coordinates {
    /// Creates a new coordinate pair
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are finite and within WGS84 ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Postal address of a store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// Parses an address that may be either free text or a structured object
    ///
    /// Returns `None` for shapes that carry no usable address fields.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) if !text.trim().is_empty() => Some(Self {
                address_line1: Some(text.trim().to_string()),
                ..Self::default()
            }),
            Value::Object(map) => {
                let field = |name: &str| map.get(name).and_then(value_to_string);
                let address = Self {
                    address_line1: field("addressLine1"),
                    address_line2: field("addressLine2"),
                    city: field("city"),
                    county: field("county"),
                    postcode: field("postcode"),
                    country: field("country"),
                };
                if address == Self::default() {
                    None
                } else {
                    Some(address)
                }
            }
            _ => None,
        }
    }

    /// First address line, as shown on result cards
    pub fn first_line(&self) -> &str {
        self.address_line1.as_deref().unwrap_or("No address available")
    }

    /// Single-line rendering: line 1, line 2, city and postcode
    pub fn one_line(&self) -> String {
        [
            self.address_line1.as_deref(),
            self.address_line2.as_deref(),
            self.city.as_deref(),
            self.postcode.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Opening and closing time for one weekday, as "HH:MM:SS" strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub open: String,
    pub close: String,
}

/// Opening times keyed by weekday
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningTimes {
    #[serde(default)]
    pub mon: Option<DayHours>,
    #[serde(default)]
    pub tue: Option<DayHours>,
    #[serde(default)]
    pub wed: Option<DayHours>,
    #[serde(default)]
    pub thu: Option<DayHours>,
    #[serde(default)]
    pub fri: Option<DayHours>,
    #[serde(default)]
    pub sat: Option<DayHours>,
    #[serde(default)]
    pub sun: Option<DayHours>,
}

impl OpeningTimes {
    /// Parses opening times leniently, dropping days with malformed entries
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let day = |key: &str| -> Option<DayHours> {
            let entry = map.get(key)?.as_object()?;
            Some(DayHours {
                open: entry.get("open").and_then(value_to_string)?,
                close: entry.get("close").and_then(value_to_string)?,
            })
        };
        Some(Self {
            mon: day("mon"),
            tue: day("tue"),
            wed: day("wed"),
            thu: day("thu"),
            fri: day("fri"),
            sat: day("sat"),
            sun: day("sun"),
        })
    }

    /// Hours for a weekday
    pub fn for_weekday(&self, weekday: chrono::Weekday) -> Option<&DayHours> {
        use chrono::Weekday;
        match weekday {
            Weekday::Mon => self.mon.as_ref(),
            Weekday::Tue => self.tue.as_ref(),
            Weekday::Wed => self.wed.as_ref(),
            Weekday::Thu => self.thu.as_ref(),
            Weekday::Fri => self.fri.as_ref(),
            Weekday::Sat => self.sat.as_ref(),
            Weekday::Sun => self.sun.as_ref(),
        }
    }
}

/// Minimal store record returned by the proximity search
///
/// Produced by normalizing the raw search payload; immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSummary {
    /// Store identifier (the store number for this retailer)
    pub id: String,
    /// Human-readable store name
    pub name: String,
    /// Category tag used by the type filter (e.g. "supermarket", "daily")
    pub category: String,
    /// Raw store format string, when supplied
    pub format: String,
    /// Store location
    pub coordinates: Coordinates,
    /// Distance from the search origin in metres
    pub distance: Option<f64>,
    /// Postal address
    pub address: Option<Address>,
    /// Contact telephone number
    pub telephone: Option<String>,
    /// Opening times as reported by the search endpoint
    pub opening_times: Option<OpeningTimes>,
}

/// A service or department entry on a store detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedItem {
    /// Machine-ish name (e.g. "rugDoctor", "pharmacy")
    pub name: String,
    /// Human-readable label, when the API supplies one
    #[serde(default)]
    pub display_name: Option<String>,
}

impl NamedItem {
    /// Parses a service/department entry from either a string or an object
    ///
    /// Objects are searched for `serviceName`, `departmentName`, `name` and
    /// `displayName` in that order.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) if !text.trim().is_empty() => Some(Self {
                name: text.trim().to_string(),
                display_name: None,
            }),
            Value::Object(map) => {
                let field = |key: &str| map.get(key).and_then(value_to_string);
                let display_name = field("displayName");
                let name = field("serviceName")
                    .or_else(|| field("departmentName"))
                    .or_else(|| field("name"))
                    .or_else(|| display_name.clone())?;
                Some(Self { name, display_name })
            }
            _ => None,
        }
    }

    /// Label shown in the detail view
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Reference to a store linked to another (e.g. a petrol station)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedStore {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

impl LinkedStore {
    /// Parses a linked-store reference; entries without an identifier are dropped
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let field = |key: &str| map.get(key).and_then(value_to_string);
        Some(Self {
            id: field("id").or_else(|| field("storeId")).or_else(|| field("name"))?,
            name: field("storeName"),
            format: field("storeFormat").or_else(|| field("format")),
        })
    }
}

/// Full store record fetched per store on demand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub opening_times: Option<OpeningTimes>,
    #[serde(default)]
    pub services: Vec<NamedItem>,
    #[serde(default)]
    pub departments: Vec<NamedItem>,
    #[serde(default)]
    pub linked_stores: Vec<LinkedStore>,
}

/// Converts a JSON string or number into a trimmed, non-empty string
pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Converts a JSON number or numeric string into a finite `f64`
pub(crate) fn value_to_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}
