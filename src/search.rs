//! Search orchestration
//!
//! Turns what the user typed (or their position) into a list of nearby
//! stores: validate, geocode, then store search, strictly in that order.
//! Searches run as background tasks; `SearchSession` makes sure only the
//! most recent one can deliver results, and `Debouncer` rate-limits searches
//! triggered by typing.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::data::{
    locate_with_timeout, Coordinates, GeocodeClient, GeocodeError, GeolocationError,
    GeolocationOptions, Geolocator, SearchParams, StoreSearchClient, StoreSearchError,
    StoreSummary,
};

/// Minimum accepted search length after trimming
pub const MIN_SEARCH_LEN: usize = 3;

/// Maximum accepted search length after trimming
pub const MAX_SEARCH_LEN: usize = 60;

/// Delay after the last keystroke before a typed search fires
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(400);

/// Punctuation allowed in place names and postcodes
const ALLOWED_PUNCTUATION: &[char] = &[' ', '-', '\'', ',', '.', '&', '/'];

/// Problems with the search text, caught before any request is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a postcode or town")]
    Empty,

    #[error("Please enter at least 3 characters")]
    TooShort,

    #[error("Search must be 60 characters or fewer")]
    TooLong,

    #[error("Search contains an invalid character: '{0}'")]
    InvalidCharacter(char),
}

/// Validates search text, returning the trimmed query
pub fn validate_search_text(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    let len = trimmed.chars().count();

    if len == 0 {
        return Err(ValidationError::Empty);
    }
    if len < MIN_SEARCH_LEN {
        return Err(ValidationError::TooShort);
    }
    if len > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong);
    }
    if let Some(bad) = trimmed
        .chars()
        .find(|c| !c.is_alphanumeric() && !ALLOWED_PUNCTUATION.contains(c))
    {
        return Err(ValidationError::InvalidCharacter(bad));
    }
    Ok(trimmed.to_string())
}

/// Any failure of a search
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error(transparent)]
    Stores(#[from] StoreSearchError),

    #[error(transparent)]
    Geolocation(#[from] GeolocationError),
}

/// What a search was for
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    Postcode(String),
    Coordinates(Coordinates),
    CurrentLocation,
}

impl SearchQuery {
    /// Text shown in headings and empty-state messages
    pub fn label(&self) -> String {
        match self {
            SearchQuery::Postcode(text) => text.clone(),
            SearchQuery::Coordinates(c) => format!("{:.4}, {:.4}", c.lat, c.lng),
            SearchQuery::CurrentLocation => "your location".to_string(),
        }
    }
}

/// Result of a successful search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub query: SearchQuery,
    pub origin: Coordinates,
    pub stores: Vec<StoreSummary>,
}

/// Runs geocode and store-search requests for one configuration
#[derive(Debug, Clone)]
pub struct StoreSearcher {
    geocoder: GeocodeClient,
    stores: StoreSearchClient,
    params: SearchParams,
}

impl StoreSearcher {
    pub fn new(geocoder: GeocodeClient, stores: StoreSearchClient, params: SearchParams) -> Self {
        Self {
            geocoder,
            stores,
            params,
        }
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Validate, geocode, then search around the geocoded point
    pub async fn search_postcode(&self, text: &str) -> Result<SearchOutcome, SearchError> {
        let query = validate_search_text(text)?;
        let origin = self.geocoder.geocode(&query).await?;
        let stores = self.stores.search(origin, &self.params).await?;
        Ok(SearchOutcome {
            query: SearchQuery::Postcode(query),
            origin,
            stores,
        })
    }

    /// Locate the user (bounded by the options' timeout), then search there
    ///
    /// No store search is issued when geolocation fails.
    pub async fn search_location(
        &self,
        geolocator: &dyn Geolocator,
        options: &GeolocationOptions,
    ) -> Result<SearchOutcome, SearchError> {
        let origin = locate_with_timeout(geolocator, options).await?;
        let stores = self.stores.search(origin, &self.params).await?;
        Ok(SearchOutcome {
            query: SearchQuery::CurrentLocation,
            origin,
            stores,
        })
    }

    /// Builds the background future for a query
    ///
    /// The geolocator is only consulted for `SearchQuery::CurrentLocation`.
    pub fn run(
        &self,
        query: SearchQuery,
        geolocator: Arc<dyn Geolocator>,
        options: GeolocationOptions,
    ) -> BoxFuture<'static, Result<SearchOutcome, SearchError>> {
        let searcher = self.clone();
        match query {
            SearchQuery::Postcode(text) => {
                async move { searcher.search_postcode(&text).await }.boxed()
            }
            SearchQuery::Coordinates(origin) => {
                async move { searcher.search_coordinates(origin).await }.boxed()
            }
            SearchQuery::CurrentLocation => async move {
                searcher
                    .search_location(geolocator.as_ref(), &options)
                    .await
            }
            .boxed(),
        }
    }

    /// Search around explicit coordinates (e.g. from a results route)
    pub async fn search_coordinates(
        &self,
        origin: Coordinates,
    ) -> Result<SearchOutcome, SearchError> {
        let stores = self.stores.search(origin, &self.params).await?;
        Ok(SearchOutcome {
            query: SearchQuery::Coordinates(origin),
            origin,
            stores,
        })
    }
}

/// Outcome of one background search, tagged with its generation
#[derive(Debug)]
pub struct SearchMessage {
    pub generation: u64,
    pub result: Result<SearchOutcome, SearchError>,
}

/// Runs at most one search at a time; starting a search supersedes the last
pub struct SearchSession {
    generation: u64,
    task: Option<JoinHandle<()>>,
    sender: mpsc::Sender<SearchMessage>,
    receiver: mpsc::Receiver<SearchMessage>,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSession {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(8);
        Self {
            generation: 0,
            task: None,
            sender,
            receiver,
        }
    }

    /// Starts a search in the background, cancelling any search in flight
    ///
    /// # Returns
    /// The generation assigned to this search
    pub fn start<F>(&mut self, search: F) -> u64
    where
        F: Future<Output = Result<SearchOutcome, SearchError>> + Send + 'static,
    {
        self.cancel();
        let generation = self.generation;
        let sender = self.sender.clone();
        self.task = Some(tokio::spawn(async move {
            let result = search.await;
            let _ = sender.send(SearchMessage { generation, result }).await;
        }));
        tracing::debug!(generation, "search started");
        generation
    }

    /// Cancels the search in flight, if any; its result will never be delivered
    pub fn cancel(&mut self) {
        self.generation += 1;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether a search is still running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Whether `generation` belongs to the current search
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Returns the current search's result if it has arrived
    ///
    /// Results of superseded searches are discarded.
    pub fn try_recv(&mut self) -> Option<SearchMessage> {
        while let Ok(message) = self.receiver.try_recv() {
            if self.is_current(message.generation) {
                self.task = None;
                return Some(message);
            }
            tracing::debug!(generation = message.generation, "dropping superseded search result");
        }
        None
    }

    /// Waits for the current search's result
    pub async fn recv(&mut self) -> Option<SearchMessage> {
        while let Some(message) = self.receiver.recv().await {
            if self.is_current(message.generation) {
                self.task = None;
                return Some(message);
            }
        }
        None
    }
}

/// Fires once after input has been quiet for a fixed delay
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE_DELAY)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Records an input change at `now`, pushing the deadline back
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Returns true once the deadline has passed, then disarms
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_postcodes_and_places() {
        assert_eq!(validate_search_text("  BA1 5NF ").unwrap(), "BA1 5NF");
        assert!(validate_search_text("Bradford-on-Avon").is_ok());
        assert!(validate_search_text("St. John's Wood, London").is_ok());
        assert!(validate_search_text("Stow/Wold & Co").is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert_eq!(validate_search_text("   "), Err(ValidationError::Empty));
        assert_eq!(validate_search_text("BA"), Err(ValidationError::TooShort));
        assert_eq!(
            validate_search_text(&"a".repeat(61)),
            Err(ValidationError::TooLong)
        );
        assert_eq!(
            validate_search_text("BA1 <script>"),
            Err(ValidationError::InvalidCharacter('<'))
        );
    }

    #[test]
    fn test_validate_length_bounds_are_inclusive() {
        assert!(validate_search_text("abc").is_ok());
        assert!(validate_search_text(&"a".repeat(60)).is_ok());
    }

    #[test]
    fn test_query_labels() {
        assert_eq!(SearchQuery::Postcode("BA1 5NF".into()).label(), "BA1 5NF");
        assert_eq!(
            SearchQuery::Coordinates(Coordinates::new(51.5, -0.12)).label(),
            "51.5000, -0.1200"
        );
    }

    #[test]
    fn test_debouncer_fires_after_quiet_period() {
        let mut debouncer = Debouncer::default();
        let start = Instant::now();

        debouncer.touch(start);
        assert!(!debouncer.fire(start + Duration::from_millis(399)));

        debouncer.touch(start + Duration::from_millis(300));
        assert!(!debouncer.fire(start + Duration::from_millis(500)));
        assert!(debouncer.fire(start + Duration::from_millis(700)));
        assert!(!debouncer.fire(start + Duration::from_millis(900)));
    }

    #[test]
    fn test_debouncer_cancel() {
        let mut debouncer = Debouncer::default();
        let start = Instant::now();

        debouncer.touch(start);
        debouncer.cancel();

        assert!(!debouncer.is_armed());
        assert!(!debouncer.fire(start + Duration::from_secs(1)));
    }

    fn outcome(label: &str) -> SearchOutcome {
        SearchOutcome {
            query: SearchQuery::Postcode(label.to_string()),
            origin: Coordinates::new(51.0, -2.0),
            stores: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_session_delivers_latest_search() {
        let mut session = SearchSession::new();

        let first = session.start(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(outcome("first"))
        });
        let second = session.start(async { Ok(outcome("second")) });

        assert!(!session.is_current(first));
        let message = session.recv().await.unwrap();
        assert_eq!(message.generation, second);
        assert_eq!(message.result.unwrap().query.label(), "second");
    }

    #[tokio::test]
    async fn test_cancelled_result_is_dropped() {
        let mut session = SearchSession::new();

        session.start(async { Ok(outcome("old")) });
        tokio::task::yield_now().await;
        session.cancel();
        tokio::task::yield_now().await;

        assert!(session.try_recv().is_none());
    }
}
