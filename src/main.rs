//! Store Finder - find nearby stores from the terminal
//!
//! A terminal UI application that searches stores by postcode or location,
//! filters them by store type and services, and shows store details.

use std::io;
use std::panic;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use storefinder::app::{App, AppServices};
use storefinder::cache::StoreCache;
use storefinder::cli::{Cli, StartupConfig};
use storefinder::config::{load_app_config, AppConfig};
use storefinder::data::{FixedGeolocator, Geolocator, SearchParams};
use storefinder::favorites::FavoritesService;
use storefinder::logging;
use storefinder::search::StoreSearcher;

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Builds the clients, cache and favorites the app runs against
fn build_services(
    config: &AppConfig,
    startup: &StartupConfig,
) -> Result<AppServices, Box<dyn std::error::Error>> {
    let client = config.http_client()?;
    let storage = config.storage();
    if storage.is_none() {
        tracing::warn!("no data directory available; cache and favorites disabled");
    }

    let cache = storage.clone().map(StoreCache::new);
    if let Some(cache) = &cache {
        let removed = cache.clear_expired();
        tracing::info!(removed, "cleared expired store cache entries");
    }

    let geolocator: Arc<dyn Geolocator> = match startup.here {
        Some(position) => Arc::new(FixedGeolocator(position)),
        None => Arc::new(config.geolocator(client.clone(), startup.allow_location)),
    };

    let params = SearchParams {
        radius_m: startup.radius_m,
        ..SearchParams::default()
    };

    Ok(AppServices {
        searcher: StoreSearcher::new(
            config.geocode_client(client.clone()),
            config.store_search_client(client.clone()),
            params,
        ),
        details: Arc::new(config.store_detail_client(client)),
        geolocator,
        cache,
        favorites: storage.map(FavoritesService::new),
    })
}

/// Removes every cached store detail and reports how many were removed
fn clear_cache(config: &AppConfig) -> ExitCode {
    match config.storage() {
        Some(storage) => {
            let removed = StoreCache::new(storage).clear_all();
            println!("Removed {} cached stores", removed);
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("Error: no data directory available");
            ExitCode::FAILURE
        }
    }
}

/// Runs the terminal UI until the user quits
async fn run_tui(services: AppServices, startup: &StartupConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::with_startup_config(services, startup);

    // Main event loop
    let result: Result<(), Box<dyn std::error::Error>> = loop {
        app.tick();

        if let Err(e) = terminal.draw(|f| storefinder::ui::render(f, &app)) {
            break Err(e.into());
        }

        // Poll for keyboard events with 100ms timeout
        match event::poll(Duration::from_millis(100)) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            },
            Ok(false) => {}
            Err(e) => break Err(e.into()),
        }

        // Check if we should quit
        if app.should_quit {
            break Ok(());
        }

        // Let background searches and detail fetches make progress
        tokio::task::yield_now().await;
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let startup = match StartupConfig::from_cli(&cli) {
        Ok(startup) => startup,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let config = match load_app_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    if startup.clear_cache {
        return clear_cache(&config);
    }

    // Logging is best effort; the UI works without it
    let log_dir = config
        .data_dir
        .clone()
        .or_else(logging::default_log_dir);
    if let Some(dir) = log_dir {
        if let Ok(path) = logging::init(&dir) {
            tracing::info!(path = %path.display(), "storefinder starting");
        }
    }

    let services = match build_services(&config, &startup) {
        Ok(services) => services,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run_tui(services, &startup).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
