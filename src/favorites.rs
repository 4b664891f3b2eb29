//! Saved favorite stores
//!
//! Favorites are kept as one JSON array under the `morrisons_favorites` key
//! of `LocalStorage` and never expire. Every change is broadcast so open
//! views can refresh their star markers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::broadcast;

use crate::cache::LocalStorage;
use crate::data::{Address, StoreDetail, StoreSummary};

/// Storage key holding the favorites list
pub const FAVORITES_KEY: &str = "morrisons_favorites";

/// A saved store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStore {
    /// Store identifier
    pub id: String,
    /// Store number as reported by the API
    pub name: String,
    /// Display name
    pub store_name: String,
    #[serde(default, deserialize_with = "lenient_address")]
    pub address: Option<Address>,
    /// When the store was saved
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub added_at: DateTime<Utc>,
}

/// Accepts any address shape and keeps what is usable
fn lenient_address<'de, D>(deserializer: D) -> Result<Option<Address>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(Address::from_value(&value))
}

impl FavoriteStore {
    /// Builds a favorite from a search result
    pub fn from_summary(store: &StoreSummary) -> Self {
        Self {
            id: store.id.clone(),
            name: store.id.clone(),
            store_name: store.name.clone(),
            address: store.address.clone(),
            added_at: Utc::now(),
        }
    }

    /// Builds a favorite from a store detail record
    pub fn from_detail(store: &StoreDetail) -> Self {
        Self {
            id: store.id.clone(),
            name: store.id.clone(),
            store_name: store.name.clone(),
            address: store.address.clone(),
            added_at: Utc::now(),
        }
    }
}

/// Notification sent whenever the favorites list changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesChange {
    Added(String),
    Removed(String),
    Cleared,
}

/// Reads and writes the favorites list
///
/// Clones share the same storage and the same change channel.
#[derive(Debug, Clone)]
pub struct FavoritesService {
    storage: LocalStorage,
    changes: broadcast::Sender<FavoritesChange>,
}

impl FavoritesService {
    pub fn new(storage: LocalStorage) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self { storage, changes }
    }

    /// Subscribes to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<FavoritesChange> {
        self.changes.subscribe()
    }

    /// All saved favorites, oldest first
    ///
    /// Missing or malformed data reads as an empty list.
    pub fn get_all(&self) -> Vec<FavoriteStore> {
        let Some(raw) = self.storage.get_item(FAVORITES_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(favorites) => favorites,
            Err(error) => {
                tracing::warn!(%error, "failed to read favorites");
                Vec::new()
            }
        }
    }

    fn save(&self, favorites: &[FavoriteStore]) -> bool {
        let result = serde_json::to_string(favorites)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            .and_then(|json| self.storage.set_item(FAVORITES_KEY, &json));
        match result {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(%error, "failed to save favorites");
                false
            }
        }
    }

    fn notify(&self, change: FavoritesChange) {
        // No receivers is fine
        let _ = self.changes.send(change);
    }

    /// Saves a favorite; returns false if it was already saved
    pub fn add(&self, favorite: FavoriteStore) -> bool {
        let mut favorites = self.get_all();
        if favorites.iter().any(|f| f.id == favorite.id) {
            tracing::debug!(store_id = favorite.id.as_str(), "store already in favorites");
            return false;
        }

        let id = favorite.id.clone();
        favorites.push(favorite);
        if !self.save(&favorites) {
            return false;
        }
        tracing::info!(store_id = id.as_str(), "added favorite");
        self.notify(FavoritesChange::Added(id));
        true
    }

    /// Removes a favorite; returns false if it was not saved
    pub fn remove(&self, store_id: &str) -> bool {
        let mut favorites = self.get_all();
        let before = favorites.len();
        favorites.retain(|f| f.id != store_id);
        if favorites.len() == before {
            return false;
        }
        if !self.save(&favorites) {
            return false;
        }
        tracing::info!(store_id, "removed favorite");
        self.notify(FavoritesChange::Removed(store_id.to_string()));
        true
    }

    /// Saves the store if absent, removes it if present
    ///
    /// # Returns
    /// Whether the store is a favorite afterwards
    pub fn toggle(&self, favorite: FavoriteStore) -> bool {
        if self.is_favorite(&favorite.id) {
            !self.remove(&favorite.id)
        } else {
            self.add(favorite)
        }
    }

    pub fn is_favorite(&self, store_id: &str) -> bool {
        self.get_all().iter().any(|f| f.id == store_id)
    }

    /// Removes every favorite
    pub fn clear_all(&self) {
        if let Err(error) = self.storage.remove_item(FAVORITES_KEY) {
            tracing::warn!(%error, "failed to clear favorites");
            return;
        }
        self.notify(FavoritesChange::Cleared);
    }
}
