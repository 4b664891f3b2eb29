//! Application state management for the store finder
//!
//! This module contains the main application state, handling keyboard input,
//! background search/detail results, and state transitions between views.

use std::sync::Arc;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::cache::StoreCache;
use crate::cli::StartupConfig;
use crate::data::{
    Coordinates, DetailSource, GeolocationOptions, Geolocator, StoreDetail, StoreSummary,
};
use crate::favorites::{FavoriteStore, FavoritesChange, FavoritesService};
use crate::filter::{self, filter_options, AppliedFilters, TypeFilter};
use crate::resolver::{DetailResolver, DetailState};
use crate::route::Route;
use crate::search::{
    validate_search_text, Debouncer, SearchMessage, SearchOutcome, SearchQuery, SearchSession,
    StoreSearcher,
};

/// Application state enum representing the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Search form
    Search,
    /// Filterable store list with map
    Results,
    /// Detail view for a specific store
    StoreDetail(String),
    /// Saved favorite stores
    Favorites,
}

/// Working state of the filter modal
///
/// Changes are made to `pending` and only replace the applied filters when
/// the user confirms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterModal {
    /// Index into `filter_options()`
    pub cursor: usize,
    pub pending: AppliedFilters,
}

/// External services the application talks to
pub struct AppServices {
    pub searcher: StoreSearcher,
    pub details: Arc<dyn DetailSource>,
    pub geolocator: Arc<dyn Geolocator>,
    pub cache: Option<StoreCache>,
    pub favorites: Option<FavoritesService>,
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// View to return to when leaving a store detail
    pub return_state: AppState,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Open filter modal, if any
    pub filter_modal: Option<FilterModal>,
    /// Search box contents
    pub input: String,
    /// Validation problem with the search box contents
    pub input_error: Option<String>,
    /// Search/geolocation failure shown to the user
    pub error_message: Option<String>,
    /// Short informational line (favorites changes, retries)
    pub notice: Option<String>,
    /// A search is in flight
    pub loading: bool,
    /// Query of the results currently shown
    pub query: Option<SearchQuery>,
    /// Query of the search in flight
    pending_query: Option<SearchQuery>,
    /// Search origin of the results currently shown
    pub origin: Option<Coordinates>,
    /// Normalized search results, unfiltered
    pub stores: Vec<StoreSummary>,
    /// Main/daily toggles
    pub type_filter: TypeFilter,
    /// Applied service/department tags
    pub tag_filters: AppliedFilters,
    /// Index of currently selected store in the visible list
    pub selected_index: usize,
    /// Index of currently selected favorite
    pub favorites_index: usize,
    /// Saved favorites (kept in sync through change notifications)
    pub favorites: Vec<FavoriteStore>,
    /// Scroll offset for store detail view
    pub detail_scroll_offset: u16,
    resolver: DetailResolver,
    session: SearchSession,
    debouncer: Debouncer,
    searcher: StoreSearcher,
    geolocator: Arc<dyn Geolocator>,
    geolocation_options: GeolocationOptions,
    favorites_service: Option<FavoritesService>,
    favorites_rx: Option<broadcast::Receiver<FavoritesChange>>,
}

impl App {
    /// Creates a new App on the search view
    pub fn new(services: AppServices) -> Self {
        let AppServices {
            searcher,
            details,
            geolocator,
            cache,
            favorites,
        } = services;

        let favorites_rx = favorites.as_ref().map(FavoritesService::subscribe);
        let saved = favorites
            .as_ref()
            .map(FavoritesService::get_all)
            .unwrap_or_default();

        Self {
            state: AppState::Search,
            return_state: AppState::Search,
            should_quit: false,
            show_help: false,
            filter_modal: None,
            input: String::new(),
            input_error: None,
            error_message: None,
            notice: None,
            loading: false,
            query: None,
            pending_query: None,
            origin: None,
            stores: Vec::new(),
            type_filter: TypeFilter::default(),
            tag_filters: AppliedFilters::new(),
            selected_index: 0,
            favorites_index: 0,
            favorites: saved,
            detail_scroll_offset: 0,
            resolver: DetailResolver::new(details, cache),
            session: SearchSession::new(),
            debouncer: Debouncer::default(),
            searcher,
            geolocator,
            geolocation_options: GeolocationOptions::default(),
            favorites_service: favorites,
            favorites_rx,
        }
    }

    /// Creates a new App and opens the view requested on the command line.
    ///
    /// Must be called inside a tokio runtime when the startup view needs a
    /// search or a detail fetch.
    ///
    /// # Arguments
    /// * `services` - Clients and storage
    /// * `config` - The startup configuration derived from CLI arguments
    pub fn with_startup_config(services: AppServices, config: &StartupConfig) -> Self {
        let mut app = Self::new(services);
        app.open_route(&config.initial_route);
        if config.locate_on_start {
            app.start_search(SearchQuery::CurrentLocation);
        }
        app
    }

    /// Navigates to a route
    pub fn open_route(&mut self, route: &Route) {
        match route {
            Route::Home => self.state = AppState::Search,
            Route::ResultsByPostcode(postcode) => {
                self.input = postcode.clone();
                self.submit_search();
            }
            Route::ResultsByCoordinates(origin) => {
                self.start_search(SearchQuery::Coordinates(*origin));
            }
            Route::StoreDetail { id, .. } => {
                self.return_state = AppState::Search;
                self.open_detail(id.clone());
            }
        }
    }

    /// Route of the current view
    pub fn current_route(&self) -> Route {
        match &self.state {
            AppState::Search | AppState::Favorites => Route::Home,
            AppState::Results => match (&self.query, self.origin) {
                (Some(SearchQuery::Postcode(text)), _) => Route::ResultsByPostcode(text.clone()),
                (_, Some(origin)) => Route::ResultsByCoordinates(origin),
                _ => Route::Home,
            },
            AppState::StoreDetail(id) => Route::store_detail(id, &self.store_name(id)),
        }
    }

    // ------------------------------------------------------------------
    // Derived views
    // ------------------------------------------------------------------

    /// Stores after the type filter and distance cap (detail is resolved for these)
    pub fn candidate_stores(&self) -> Vec<StoreSummary> {
        filter::candidate_stores(&self.stores, self.type_filter)
    }

    /// Stores shown in the list and on the map
    pub fn visible_stores(&self) -> Vec<StoreSummary> {
        filter::visible_stores(&self.stores, self.type_filter, &self.tag_filters, |id| {
            self.resolver.detail(id)
        })
    }

    /// Currently selected visible store
    pub fn selected_store(&self) -> Option<StoreSummary> {
        self.visible_stores().into_iter().nth(self.selected_index)
    }

    /// Number of candidate stores whose detail is still being fetched
    pub fn pending_details(&self) -> usize {
        self.resolver.pending_count()
    }

    pub fn detail(&self, store_id: &str) -> Option<&StoreDetail> {
        self.resolver.detail(store_id)
    }

    pub fn detail_state(&self, store_id: &str) -> Option<&DetailState> {
        self.resolver.state(store_id)
    }

    /// Search result for a store id, if it is in the current results
    pub fn summary(&self, store_id: &str) -> Option<&StoreSummary> {
        self.stores.iter().find(|s| s.id == store_id)
    }

    /// Best known display name for a store
    pub fn store_name(&self, store_id: &str) -> String {
        self.detail(store_id)
            .map(|d| d.name.clone())
            .or_else(|| self.summary(store_id).map(|s| s.name.clone()))
            .or_else(|| {
                self.favorites
                    .iter()
                    .find(|f| f.id == store_id)
                    .map(|f| f.store_name.clone())
            })
            .unwrap_or_else(|| store_id.to_string())
    }

    pub fn is_favorite(&self, store_id: &str) -> bool {
        self.favorites.iter().any(|f| f.id == store_id)
    }

    // ------------------------------------------------------------------
    // Searching
    // ------------------------------------------------------------------

    /// Validates the search box and starts a postcode search
    ///
    /// Invalid input is reported locally and no request is made.
    pub fn submit_search(&mut self) {
        self.debouncer.cancel();
        match validate_search_text(&self.input) {
            Ok(query) => {
                self.input_error = None;
                self.start_search(SearchQuery::Postcode(query));
            }
            Err(error) => {
                self.input_error = Some(error.to_string());
            }
        }
    }

    /// Starts a background search, superseding any search in flight
    pub fn start_search(&mut self, query: SearchQuery) {
        self.debouncer.cancel();
        self.loading = true;
        self.error_message = None;
        self.notice = None;
        self.pending_query = Some(query.clone());

        tracing::info!(query = %query.label(), "starting search");
        let search = self.searcher.run(
            query,
            Arc::clone(&self.geolocator),
            self.geolocation_options.clone(),
        );
        self.session.start(search);
    }

    /// Applies the result of the current search
    pub fn apply_search_message(&mut self, message: SearchMessage) {
        self.loading = false;
        match message.result {
            Ok(outcome) => self.apply_search_outcome(outcome),
            Err(error) => {
                tracing::warn!(%error, "search failed");
                self.resolver.reset();
                self.stores.clear();
                self.query = self.pending_query.take();
                self.origin = None;
                self.selected_index = 0;
                self.error_message = Some(error.to_string());
                if self.state != AppState::Search {
                    self.state = AppState::Results;
                }
            }
        }
    }

    /// Replaces the results with a new search outcome
    pub fn apply_search_outcome(&mut self, outcome: SearchOutcome) {
        self.loading = false;
        self.pending_query = None;
        self.resolver.reset();
        self.error_message = None;
        if let SearchQuery::Postcode(text) = &outcome.query {
            self.input = text.clone();
        }
        self.query = Some(outcome.query);
        self.origin = Some(outcome.origin);
        self.stores = outcome.stores;
        self.selected_index = 0;
        self.state = AppState::Results;
        self.resolve_candidates();
    }

    /// Starts detail fetches for candidates that have no detail yet
    fn resolve_candidates(&mut self) {
        let candidates = self.candidate_stores();
        self.resolver.resolve_missing(&candidates);
    }

    /// Re-fetches details that failed for the current candidates
    pub fn retry_failed_details(&mut self) -> usize {
        let failed: Vec<String> = self
            .candidate_stores()
            .into_iter()
            .filter(|s| matches!(self.resolver.state(&s.id), Some(DetailState::Failed { .. })))
            .map(|s| s.id)
            .collect();
        for id in &failed {
            self.resolver.retry(id);
        }
        if !failed.is_empty() {
            self.notice = Some(format!("Retrying details for {} stores", failed.len()));
        }
        failed.len()
    }

    // ------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------

    /// Processes background results and timers
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Processes background results and timers as of `now`
    pub fn tick_at(&mut self, now: Instant) {
        while let Some(message) = self.session.try_recv() {
            self.apply_search_message(message);
        }

        if self.resolver.drain() > 0 {
            self.clamp_selection();
        }

        self.sync_favorites();

        if self.debouncer.fire(now) && validate_search_text(&self.input).is_ok() {
            self.submit_search();
        }
    }

    /// Reloads favorites if a change notification arrived
    fn sync_favorites(&mut self) {
        let Some(rx) = self.favorites_rx.as_mut() else {
            return;
        };
        let mut changed = false;
        loop {
            match rx.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => changed = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        if changed {
            self.reload_favorites();
        }
    }

    fn reload_favorites(&mut self) {
        if let Some(service) = &self.favorites_service {
            self.favorites = service.get_all();
        }
        if self.favorites_index >= self.favorites.len() {
            self.favorites_index = self.favorites.len().saturating_sub(1);
        }
    }

    // ------------------------------------------------------------------
    // Navigation helpers
    // ------------------------------------------------------------------

    fn clamp_selection(&mut self) {
        let count = self.visible_stores().len();
        if self.selected_index >= count {
            self.selected_index = count.saturating_sub(1);
        }
    }

    /// Moves the selection up in the list, wrapping to bottom if at top
    fn move_selection_up(&mut self) {
        let count = self.visible_stores().len();
        if count == 0 {
            return;
        }
        if self.selected_index == 0 {
            self.selected_index = count - 1;
        } else {
            self.selected_index -= 1;
        }
    }

    /// Moves the selection down in the list, wrapping to top if at bottom
    fn move_selection_down(&mut self) {
        let count = self.visible_stores().len();
        if count == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % count;
    }

    fn move_favorite_up(&mut self) {
        let count = self.favorites.len();
        if count == 0 {
            return;
        }
        self.favorites_index = (self.favorites_index + count - 1) % count;
    }

    fn move_favorite_down(&mut self) {
        let count = self.favorites.len();
        if count == 0 {
            return;
        }
        self.favorites_index = (self.favorites_index + 1) % count;
    }

    /// Opens a store's detail view and concentrates fetching on it
    pub fn open_detail(&mut self, store_id: String) {
        self.detail_scroll_offset = 0;
        self.resolver.focus(&store_id);
        self.state = AppState::StoreDetail(store_id);
    }

    /// Leaves the detail view; candidates cancelled by `focus` resume
    fn close_detail(&mut self) {
        self.detail_scroll_offset = 0;
        self.state = match self.return_state {
            AppState::Results if self.query.is_some() => AppState::Results,
            AppState::Favorites => AppState::Favorites,
            _ if self.query.is_some() => AppState::Results,
            _ => AppState::Search,
        };
        self.resolve_candidates();
    }

    fn set_type_filter(&mut self, type_filter: TypeFilter) {
        self.type_filter = type_filter;
        self.selected_index = 0;
        self.resolve_candidates();
    }

    fn clear_filters(&mut self) {
        self.tag_filters.clear();
        self.set_type_filter(TypeFilter::default());
    }

    /// Adds or removes a store from favorites
    pub fn toggle_favorite(&mut self, store_id: &str) {
        let Some(service) = &self.favorites_service else {
            self.notice = Some("Favorites are unavailable".to_string());
            return;
        };

        let favorite = if let Some(detail) = self.resolver.detail(store_id) {
            FavoriteStore::from_detail(detail)
        } else if let Some(summary) = self.summary(store_id) {
            FavoriteStore::from_summary(summary)
        } else if let Some(existing) = self.favorites.iter().find(|f| f.id == store_id) {
            existing.clone()
        } else {
            return;
        };

        let name = favorite.store_name.clone();
        let now_favorite = service.toggle(favorite);
        self.notice = Some(if now_favorite {
            format!("Added {} to favorites", name)
        } else {
            format!("Removed {} from favorites", name)
        });
        self.reload_favorites();
    }

    fn open_filter_modal(&mut self) {
        self.filter_modal = Some(FilterModal {
            cursor: 0,
            pending: self.tag_filters.clone(),
        });
    }

    // ------------------------------------------------------------------
    // Key handling
    // ------------------------------------------------------------------

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Arguments
    /// * `key_event` - The keyboard event to handle
    ///
    /// # Key Bindings
    /// - `Ctrl+C`: Quit from anywhere
    /// - Search: type to edit, `Enter` search, `Ctrl+L` use my location,
    ///   `Ctrl+F` favorites, `Tab`/`Down` back to results, `Esc` results or quit
    /// - Results: `j`/`k` move, `Enter` details, `/` search, `m`/`d` store
    ///   type, `f` filters, `c` clear filters, `*` favorite, `v` favorites,
    ///   `l` use my location, `r` retry failed details
    /// - Detail: `Esc` back, `*` favorite, `r` retry, `j`/`k` scroll
    /// - Favorites: `j`/`k` move, `Enter` details, `x` remove, `Esc` back
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        if key_event.modifiers.contains(KeyModifiers::CONTROL)
            && key_event.code == KeyCode::Char('c')
        {
            self.should_quit = true;
            return;
        }

        // Help overlay intercepts all keys when shown
        if self.show_help {
            if matches!(
                key_event.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return;
        }

        if self.filter_modal.is_some() {
            self.handle_filter_modal_key(key_event);
            return;
        }

        match self.state.clone() {
            AppState::Search => self.handle_search_key(key_event),
            AppState::Results => self.handle_results_key(key_event),
            AppState::StoreDetail(store_id) => self.handle_detail_key(key_event, &store_id),
            AppState::Favorites => self.handle_favorites_key(key_event),
        }
    }

    fn handle_search_key(&mut self, key_event: KeyEvent) {
        let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);
        match key_event.code {
            KeyCode::Char('l') if ctrl => {
                self.input_error = None;
                self.start_search(SearchQuery::CurrentLocation);
            }
            KeyCode::Char('f') if ctrl => {
                self.state = AppState::Favorites;
            }
            KeyCode::Char(c) if !ctrl => {
                self.input.push(c);
                self.input_error = None;
                self.debouncer.touch(Instant::now());
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.input_error = None;
                self.debouncer.touch(Instant::now());
            }
            KeyCode::Enter => self.submit_search(),
            KeyCode::Tab | KeyCode::Down => {
                if self.query.is_some() {
                    self.debouncer.cancel();
                    self.state = AppState::Results;
                }
            }
            KeyCode::Esc => {
                self.debouncer.cancel();
                if self.query.is_some() {
                    self.state = AppState::Results;
                } else {
                    self.should_quit = true;
                }
            }
            _ => {}
        }
    }

    fn handle_results_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Esc | KeyCode::Char('/') | KeyCode::Char('s') => {
                self.state = AppState::Search;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection_up();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection_down();
            }
            KeyCode::Enter => {
                if let Some(store) = self.selected_store() {
                    self.return_state = AppState::Results;
                    self.open_detail(store.id);
                }
            }
            KeyCode::Char('m') => {
                let mut type_filter = self.type_filter;
                type_filter.main = !type_filter.main;
                self.set_type_filter(type_filter);
            }
            KeyCode::Char('d') => {
                let mut type_filter = self.type_filter;
                type_filter.daily = !type_filter.daily;
                self.set_type_filter(type_filter);
            }
            KeyCode::Char('f') => {
                self.open_filter_modal();
            }
            KeyCode::Char('c') => {
                self.clear_filters();
            }
            KeyCode::Char('*') | KeyCode::Char(' ') => {
                if let Some(store) = self.selected_store() {
                    self.toggle_favorite(&store.id);
                }
            }
            KeyCode::Char('v') => {
                self.state = AppState::Favorites;
            }
            KeyCode::Char('l') => {
                self.start_search(SearchQuery::CurrentLocation);
            }
            KeyCode::Char('r') => {
                self.retry_failed_details();
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key_event: KeyEvent, store_id: &str) {
        match key_event.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Esc | KeyCode::Backspace => {
                self.close_detail();
            }
            KeyCode::Char('*') | KeyCode::Char(' ') => {
                self.toggle_favorite(store_id);
            }
            KeyCode::Char('r') => {
                if self.resolver.retry(store_id) {
                    self.notice = Some("Retrying store details".to_string());
                }
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.detail_scroll_offset = self.detail_scroll_offset.saturating_add(1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.detail_scroll_offset = self.detail_scroll_offset.saturating_sub(1);
            }
            KeyCode::Char('g') => {
                self.detail_scroll_offset = 0;
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    fn handle_favorites_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Esc => {
                self.state = if self.query.is_some() {
                    AppState::Results
                } else {
                    AppState::Search
                };
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_favorite_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_favorite_down(),
            KeyCode::Enter => {
                if let Some(favorite) = self.favorites.get(self.favorites_index) {
                    let id = favorite.id.clone();
                    self.return_state = AppState::Favorites;
                    self.open_detail(id);
                }
            }
            KeyCode::Char('x') | KeyCode::Delete | KeyCode::Char('*') => {
                if let Some(favorite) = self.favorites.get(self.favorites_index) {
                    let id = favorite.id.clone();
                    self.toggle_favorite(&id);
                }
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    fn handle_filter_modal_key(&mut self, key_event: KeyEvent) {
        let options = filter_options();
        let Some(modal) = self.filter_modal.as_mut() else {
            return;
        };

        match key_event.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.filter_modal = None;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                modal.cursor = (modal.cursor + options.len() - 1) % options.len();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                modal.cursor = (modal.cursor + 1) % options.len();
            }
            KeyCode::Char(' ') | KeyCode::Char('x') => {
                if let Some((_, label)) = options.get(modal.cursor) {
                    modal.pending.toggle(label);
                }
            }
            KeyCode::Char('c') => {
                modal.pending.clear();
            }
            KeyCode::Enter | KeyCode::Char('a') => {
                let applied = modal.pending.clone();
                self.filter_modal = None;
                tracing::debug!(tags = applied.len(), "applying tag filters");
                self.tag_filters = applied;
                self.selected_index = 0;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LocalStorage;
    use crate::data::{
        DetailError, FixedGeolocator, GeocodeClient, NamedItem, SearchParams, StoreSearchClient,
    };
    use async_trait::async_trait;
    use reqwest::Client;
    use tempfile::TempDir;

    struct StubDetails;

    #[async_trait]
    impl DetailSource for StubDetails {
        async fn fetch_detail(&self, store_id: &str) -> Result<StoreDetail, DetailError> {
            let services = if store_id == "1" { vec!["Cafe"] } else { vec!["Car Wash"] };
            Ok(StoreDetail {
                id: store_id.to_string(),
                name: format!("Store {store_id}"),
                address: None,
                telephone: None,
                opening_times: None,
                services: services
                    .into_iter()
                    .map(|s| NamedItem {
                        name: s.to_string(),
                        display_name: None,
                    })
                    .collect(),
                departments: Vec::new(),
                linked_stores: Vec::new(),
            })
        }
    }

    /// Helper to create a KeyEvent for testing
    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app(temp_dir: &TempDir) -> App {
        let client = Client::new();
        let unreachable = "http://127.0.0.1:9";
        let storage = LocalStorage::with_dir(temp_dir.path().to_path_buf());
        App::new(AppServices {
            searcher: StoreSearcher::new(
                GeocodeClient::new(client.clone(), Some("key".into())).with_base_url(unreachable),
                StoreSearchClient::new(client, "key").with_base_url(unreachable),
                SearchParams::default(),
            ),
            details: Arc::new(StubDetails),
            geolocator: Arc::new(FixedGeolocator(Coordinates::new(51.38, -2.36))),
            cache: Some(StoreCache::new(storage.clone())),
            favorites: Some(FavoritesService::new(storage)),
        })
    }

    fn store(id: &str, category: &str, distance: f64) -> StoreSummary {
        StoreSummary {
            id: id.to_string(),
            name: format!("Store {id}"),
            category: category.to_string(),
            format: String::new(),
            coordinates: Coordinates::new(51.38, -2.36),
            distance: Some(distance),
            address: None,
            telephone: None,
            opening_times: None,
        }
    }

    fn outcome(stores: Vec<StoreSummary>) -> SearchOutcome {
        SearchOutcome {
            query: SearchQuery::Postcode("BA1 5NF".to_string()),
            origin: Coordinates::new(51.38, -2.36),
            stores,
        }
    }

    #[test]
    fn test_initial_state_is_search() {
        let temp_dir = TempDir::new().unwrap();
        let app = test_app(&temp_dir);
        assert_eq!(app.state, AppState::Search);
        assert!(app.stores.is_empty());
        assert!(!app.loading);
    }

    #[test]
    fn test_short_input_is_rejected_without_search() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);

        app.handle_key(key_event(KeyCode::Char('B')));
        app.handle_key(key_event(KeyCode::Char('A')));
        app.handle_key(key_event(KeyCode::Enter));

        assert!(app.input_error.is_some());
        assert!(!app.loading);
        assert!(app.stores.is_empty());
        assert_eq!(app.state, AppState::Search);
    }

    #[test]
    fn test_esc_quits_from_empty_search() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);
        app.handle_key(key_event(KeyCode::Esc));
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits_anywhere() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_outcome_shows_results_and_resolves_details() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);

        app.apply_search_outcome(outcome(vec![
            store("2", "supermarket", 200.0),
            store("1", "supermarket", 100.0),
        ]));

        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.visible_stores()[0].id, "1");
        assert_eq!(app.pending_details(), 2);

        while app.pending_details() > 0 {
            app.resolver.wait_next().await;
        }
        assert!(app.detail("1").is_some());
    }

    #[tokio::test]
    async fn test_tag_filter_excludes_until_detail_arrives() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);
        app.apply_search_outcome(outcome(vec![
            store("1", "supermarket", 100.0),
            store("2", "supermarket", 200.0),
        ]));

        app.handle_key(key_event(KeyCode::Char('f')));
        assert!(app.filter_modal.is_some());
        // "Cafe" is the second popular filter
        app.handle_key(key_event(KeyCode::Down));
        app.handle_key(key_event(KeyCode::Char(' ')));
        app.handle_key(key_event(KeyCode::Enter));

        assert!(app.filter_modal.is_none());
        assert!(app.tag_filters.contains("cafe"));
        assert!(app.visible_stores().is_empty());

        while app.pending_details() > 0 {
            app.resolver.wait_next().await;
        }
        let visible: Vec<String> = app.visible_stores().into_iter().map(|s| s.id).collect();
        assert_eq!(visible, vec!["1"]);
    }

    #[tokio::test]
    async fn test_filter_modal_esc_discards_changes() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);
        app.apply_search_outcome(outcome(vec![store("1", "supermarket", 100.0)]));

        app.handle_key(key_event(KeyCode::Char('f')));
        app.handle_key(key_event(KeyCode::Char(' ')));
        app.handle_key(key_event(KeyCode::Esc));

        assert!(app.tag_filters.is_empty());
    }

    #[tokio::test]
    async fn test_type_toggles() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);
        app.apply_search_outcome(outcome(vec![
            store("1", "supermarket", 100.0),
            store("2", "daily", 200.0),
        ]));

        app.handle_key(key_event(KeyCode::Char('d')));
        let ids: Vec<String> = app.visible_stores().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["2"]);

        app.handle_key(key_event(KeyCode::Char('m')));
        assert_eq!(app.visible_stores().len(), 2);

        app.handle_key(key_event(KeyCode::Char('c')));
        assert_eq!(app.type_filter, TypeFilter::default());
    }

    #[tokio::test]
    async fn test_navigation_wraps() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);
        app.apply_search_outcome(outcome(vec![
            store("1", "supermarket", 100.0),
            store("2", "supermarket", 200.0),
        ]));

        app.handle_key(key_event(KeyCode::Char('k')));
        assert_eq!(app.selected_index, 1);
        app.handle_key(key_event(KeyCode::Char('j')));
        assert_eq!(app.selected_index, 0);
    }

    #[tokio::test]
    async fn test_enter_opens_detail_and_esc_returns() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);
        app.apply_search_outcome(outcome(vec![store("1", "supermarket", 100.0)]));

        app.handle_key(key_event(KeyCode::Enter));
        assert_eq!(app.state, AppState::StoreDetail("1".to_string()));
        assert_eq!(app.current_route().to_path(), "/storefinder/1/store-1");

        app.handle_key(key_event(KeyCode::Esc));
        assert_eq!(app.state, AppState::Results);
    }

    #[tokio::test]
    async fn test_favorite_toggle_from_results() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);
        app.apply_search_outcome(outcome(vec![store("1", "supermarket", 100.0)]));

        app.handle_key(key_event(KeyCode::Char('*')));
        assert!(app.is_favorite("1"));
        assert!(app.notice.as_deref().unwrap_or("").contains("Added"));

        app.handle_key(key_event(KeyCode::Char('*')));
        assert!(!app.is_favorite("1"));
    }

    #[tokio::test]
    async fn test_favorites_view_remove() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);
        app.apply_search_outcome(outcome(vec![store("1", "supermarket", 100.0)]));
        app.toggle_favorite("1");

        app.handle_key(key_event(KeyCode::Char('v')));
        assert_eq!(app.state, AppState::Favorites);
        app.handle_key(key_event(KeyCode::Char('x')));

        assert!(app.favorites.is_empty());
        app.handle_key(key_event(KeyCode::Esc));
        assert_eq!(app.state, AppState::Results);
    }

    #[tokio::test]
    async fn test_help_overlay_intercepts_keys() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);
        app.apply_search_outcome(outcome(vec![store("1", "supermarket", 100.0)]));

        app.handle_key(key_event(KeyCode::Char('?')));
        assert!(app.show_help);
        app.handle_key(key_event(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_location_search_runs_in_background() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);

        app.handle_key(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL));
        assert!(app.loading);

        // The store API is unreachable, so the search ends in an error
        let message = app.session.recv().await.unwrap();
        app.apply_search_message(message);

        assert!(!app.loading);
        assert!(app.error_message.is_some());
        assert!(app.stores.is_empty());
    }

    #[test]
    fn test_debounced_typing_waits_for_quiet_period() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = test_app(&temp_dir);

        app.handle_key(key_event(KeyCode::Char('L')));
        app.tick_at(Instant::now());

        assert!(!app.loading);
        assert!(app.debouncer.is_armed());
    }
}
