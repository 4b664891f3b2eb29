//! File-backed key/value string store
//!
//! Provides a `LocalStorage` that persists string values as individual files in
//! an XDG-compliant data directory, mirroring the get/set/remove/keys surface of
//! browser local storage.

use directories::ProjectDirs;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File extension used for every stored item
const ITEM_EXTENSION: &str = "json";

/// Persistent key/value store for string values
///
/// Each key maps to one file (`<key>.json`) inside the storage directory
/// (`~/.local/share/storefinder/` on Linux). Keys are sanitized so that only
/// ASCII alphanumerics, `_` and `-` reach the filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    /// Directory where items are stored
    dir: PathBuf,
}

impl LocalStorage {
    /// Creates a new LocalStorage using the XDG-compliant data directory
    ///
    /// Returns `None` if the data directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "storefinder")?;
        Some(Self {
            dir: project_dirs.data_dir().to_path_buf(),
        })
    }

    /// Creates a new LocalStorage rooted at a custom directory
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Returns the directory backing this store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Maps a key onto a filesystem-safe file stem
    fn sanitize_key(key: &str) -> String {
        key.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    /// Returns the path of the file holding the given key
    fn item_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", Self::sanitize_key(key), ITEM_EXTENSION))
    }

    /// Reads the value stored under `key`
    ///
    /// Returns `None` if the key is absent or the file cannot be read.
    pub fn get_item(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.item_path(key)).ok()
    }

    /// Stores `value` under `key`, overwriting any previous value
    ///
    /// Creates the storage directory on first write.
    pub fn set_item(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.item_path(key), value)
    }

    /// Removes the value stored under `key`
    ///
    /// Removing a key that does not exist is not an error.
    pub fn remove_item(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.item_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Lists every key currently stored (in sanitized form)
    pub fn keys(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut keys: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == ITEM_EXTENSION))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
            })
            .collect();
        keys.sort();
        keys
    }
}
