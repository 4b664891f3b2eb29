//! File logging
//!
//! The terminal belongs to the TUI, so log output goes to
//! `storefinder.log` in the cache directory. `RUST_LOG` controls the filter
//! (default `storefinder=info`).

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "storefinder.log";

/// Filter used when `RUST_LOG` is unset or invalid
const DEFAULT_FILTER: &str = "storefinder=info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to install log subscriber: {0}")]
    Subscriber(String),
}

/// Default log directory (`~/.cache/storefinder` on Linux)
pub fn default_log_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "storefinder").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Builds the filter from `RUST_LOG`, falling back to the default
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber writing to `<dir>/storefinder.log`
///
/// # Returns
/// The path of the log file
pub fn init(dir: &Path) -> Result<PathBuf, LoggingError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| LoggingError::Subscriber(e.to_string()))?;

    Ok(path)
}
