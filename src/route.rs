//! Addressable views
//!
//! Each screen has a path so it can be opened directly (`--route`):
//!
//! - `/` search form
//! - `/storefinder?postcode=BA1%205NF` results for a postcode
//! - `/storefinder?lat=51.38&lng=-2.36` results around a point
//! - `/storefinder/{id}/{slug}` one store's detail

use percent_encoding::percent_decode_str;
use reqwest::Url;

use crate::data::Coordinates;

/// Base used to parse bare paths
const ROUTE_BASE: &str = "http://storefinder.local/";

/// Path segment of the store finder views
const STOREFINDER: &str = "storefinder";

/// A view of the application
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Home,
    ResultsByPostcode(String),
    ResultsByCoordinates(Coordinates),
    StoreDetail { id: String, slug: String },
}

impl Route {
    /// Route to a store's detail view, with the slug derived from its name
    pub fn store_detail(id: &str, name: &str) -> Self {
        Route::StoreDetail {
            id: id.to_string(),
            slug: slugify(name),
        }
    }

    /// Renders the route as a path (with query string when needed)
    pub fn to_path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::ResultsByPostcode(postcode) => match Url::parse(ROUTE_BASE) {
                Ok(mut url) => {
                    url.query_pairs_mut().append_pair("postcode", postcode);
                    format!("/{STOREFINDER}?{}", url.query().unwrap_or_default())
                }
                Err(_) => format!("/{STOREFINDER}?postcode={postcode}"),
            },
            Route::ResultsByCoordinates(c) => {
                format!("/{STOREFINDER}?lat={}&lng={}", c.lat, c.lng)
            }
            Route::StoreDetail { id, slug } => {
                let mut url = match Url::parse(ROUTE_BASE) {
                    Ok(url) => url,
                    Err(_) => return format!("/{STOREFINDER}/{id}/{slug}"),
                };
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.clear().push(STOREFINDER).push(id).push(slug);
                }
                url.path().to_string()
            }
        }
    }

    /// Parses a path; unknown paths yield `None`
    pub fn parse(path: &str) -> Option<Self> {
        let base = Url::parse(ROUTE_BASE).ok()?;
        let url = base.join(path.trim()).ok()?;

        let segments: Vec<String> = url
            .path_segments()
            .map(|parts| {
                parts
                    .filter(|s| !s.is_empty())
                    .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        match segments.as_slice() {
            [] => Some(Route::Home),
            [first] if first == STOREFINDER => Self::parse_results(&url),
            [first, id] if first == STOREFINDER => Some(Route::StoreDetail {
                id: id.clone(),
                slug: String::new(),
            }),
            [first, id, slug] if first == STOREFINDER => Some(Route::StoreDetail {
                id: id.clone(),
                slug: slug.clone(),
            }),
            _ => None,
        }
    }

    fn parse_results(url: &Url) -> Option<Self> {
        let mut postcode = None;
        let mut lat = None;
        let mut lng = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "postcode" => postcode = Some(value.trim().to_string()),
                "lat" => lat = value.parse::<f64>().ok(),
                "lng" | "lon" => lng = value.parse::<f64>().ok(),
                _ => {}
            }
        }

        if let Some(postcode) = postcode.filter(|p| !p.is_empty()) {
            return Some(Route::ResultsByPostcode(postcode));
        }
        let coords = Coordinates::new(lat?, lng?);
        coords.is_valid().then_some(Route::ResultsByCoordinates(coords))
    }
}

/// URL slug for a store name
///
/// Lowercased; anything other than ASCII letters, digits, `_`, whitespace and
/// `-` dropped; whitespace runs become `-`; repeated hyphens collapse. The
/// name is not trimmed, so edge whitespace leaves an edge hyphen.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        let c = if c.is_whitespace() {
            '-'
        } else if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            c
        } else {
            continue;
        };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug
}
