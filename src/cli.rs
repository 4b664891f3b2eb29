//! Command-line interface parsing for the store finder
//!
//! Handles the startup flags: an initial postcode search, a fixed position
//! for "use my location", location consent, search radius, opening a view by
//! path, and clearing the store cache.

use clap::Parser;
use thiserror::Error;

use crate::data::Coordinates;
use crate::route::Route;
use crate::search::{validate_search_text, ValidationError};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The --postcode value failed validation
    #[error("Invalid postcode '{value}': {reason}")]
    InvalidPostcode {
        value: String,
        reason: ValidationError,
    },

    /// The --here value is not "LAT,LNG"
    #[error("Invalid coordinates: '{0}'. Expected LAT,LNG such as 51.38,-2.36")]
    InvalidCoordinates(String),

    /// The --route value is not a known view
    #[error("Invalid route: '{0}'. Try /, /storefinder?postcode=..., or /storefinder/<id>/<slug>")]
    InvalidRoute(String),

    /// The --radius value is zero
    #[error("Invalid radius: must be greater than zero")]
    InvalidRadius,
}

/// Store Finder - find nearby stores by postcode or location
#[derive(Parser, Debug)]
#[command(name = "storefinder")]
#[command(about = "Find nearby stores by postcode or location, filter them, and browse store details")]
#[command(version)]
pub struct Cli {
    /// Search for stores near a postcode or town on startup
    ///
    /// Examples:
    ///   storefinder --postcode "BA1 5NF"
    ///   storefinder --postcode Leeds
    #[arg(long, value_name = "POSTCODE", conflicts_with = "route")]
    pub postcode: Option<String>,

    /// Use these coordinates as your location (LAT,LNG)
    #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true)]
    pub here: Option<String>,

    /// Allow looking up your approximate location over the network
    #[arg(long)]
    pub allow_location: bool,

    /// Search radius in metres
    #[arg(long, value_name = "METRES", default_value_t = 50_000)]
    pub radius: u32,

    /// Open a view directly, e.g. /storefinder/118/bath
    #[arg(long, value_name = "PATH")]
    pub route: Option<String>,

    /// Remove all cached store details and exit
    #[arg(long)]
    pub clear_cache: bool,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, PartialEq)]
pub struct StartupConfig {
    /// View to open first
    pub initial_route: Route,
    /// Fixed position from --here
    pub here: Option<Coordinates>,
    /// Whether to run a location search immediately
    pub locate_on_start: bool,
    /// Whether network location lookup is allowed
    pub allow_location: bool,
    /// Search radius in metres
    pub radius_m: u32,
    /// Clear the cache and exit instead of starting the UI
    pub clear_cache: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            initial_route: Route::Home,
            here: None,
            locate_on_start: false,
            allow_location: false,
            radius_m: 50_000,
            clear_cache: false,
        }
    }
}

/// Parses a "LAT,LNG" argument into coordinates.
///
/// # Arguments
/// * `s` - The coordinate string from CLI
///
/// # Returns
/// * `Ok(Coordinates)` if both parts parse and are in range
/// * `Err(CliError::InvalidCoordinates)` otherwise
pub fn parse_coordinates_arg(s: &str) -> Result<Coordinates, CliError> {
    let invalid = || CliError::InvalidCoordinates(s.to_string());
    let (lat, lng) = s.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;
    let coords = Coordinates::new(lat, lng);
    if coords.is_valid() {
        Ok(coords)
    } else {
        Err(invalid())
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// An explicit `--postcode` or `--route` picks the first view; otherwise
    /// `--here` starts with a search around that position.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if any argument is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.radius == 0 {
            return Err(CliError::InvalidRadius);
        }

        let here = cli.here.as_deref().map(parse_coordinates_arg).transpose()?;

        let initial_route = if let Some(postcode) = &cli.postcode {
            let query =
                validate_search_text(postcode).map_err(|reason| CliError::InvalidPostcode {
                    value: postcode.clone(),
                    reason,
                })?;
            Route::ResultsByPostcode(query)
        } else if let Some(path) = &cli.route {
            Route::parse(path).ok_or_else(|| CliError::InvalidRoute(path.clone()))?
        } else {
            Route::Home
        };

        let locate_on_start = here.is_some() && initial_route == Route::Home;

        Ok(StartupConfig {
            initial_route,
            here,
            locate_on_start,
            allow_location: cli.allow_location,
            radius_m: cli.radius,
            clear_cache: cli.clear_cache,
        })
    }
}
