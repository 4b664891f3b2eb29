//! Time-bounded cache of store detail payloads
//!
//! Entries live in `LocalStorage` under `store_cache_<id>` and carry the time
//! they were written. An entry is valid only while it is younger than the
//! 30 minute TTL; reads of expired or corrupt entries evict them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::LocalStorage;
use crate::data::StoreDetail;

/// Validity window of a cache entry in minutes
pub const CACHE_TTL_MINUTES: i64 = 30;

/// Prefix for every cache key in local storage
pub const CACHE_KEY_PREFIX: &str = "store_cache_";

/// On-disk representation of a cached store detail
#[derive(Debug, Serialize, Deserialize)]
struct CachedStore {
    data: StoreDetail,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
}

/// Cache of store details keyed by store id
///
/// Cloning is cheap and all clones share the same backing storage. Writes are
/// last-write-wins; concurrent writers for one id store the same payload.
/// There is no size bound beyond TTL expiry.
#[derive(Debug, Clone)]
pub struct StoreCache {
    storage: LocalStorage,
    ttl: Duration,
}

impl StoreCache {
    /// Creates a cache over the given storage with the standard 30 minute TTL
    pub fn new(storage: LocalStorage) -> Self {
        Self {
            storage,
            ttl: Duration::minutes(CACHE_TTL_MINUTES),
        }
    }

    fn key(store_id: &str) -> String {
        format!("{}{}", CACHE_KEY_PREFIX, store_id)
    }

    fn is_fresh(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - timestamp < self.ttl
    }

    /// Stores a detail payload stamped with the current time
    pub fn set(&self, store_id: &str, detail: &StoreDetail) {
        self.set_at(store_id, detail, Utc::now());
    }

    /// Stores a detail payload stamped with `now`, overwriting any prior entry
    ///
    /// Storage failures are logged and otherwise ignored.
    pub fn set_at(&self, store_id: &str, detail: &StoreDetail, now: DateTime<Utc>) {
        let entry = CachedStore {
            data: detail.clone(),
            timestamp: now,
        };
        let result = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            .and_then(|json| self.storage.set_item(&Self::key(store_id), &json));

        match result {
            Ok(()) => tracing::debug!(store_id, "cached store detail"),
            Err(error) => tracing::warn!(store_id, %error, "failed to cache store detail"),
        }
    }

    /// Returns the cached detail if present and unexpired
    pub fn get(&self, store_id: &str) -> Option<StoreDetail> {
        self.get_at(store_id, Utc::now())
    }

    /// Returns the cached detail if present and younger than the TTL at `now`
    ///
    /// Expired and unreadable entries are evicted and reported as misses.
    pub fn get_at(&self, store_id: &str, now: DateTime<Utc>) -> Option<StoreDetail> {
        let key = Self::key(store_id);
        let raw = self.storage.get_item(&key)?;

        let entry = match serde_json::from_str::<CachedStore>(&raw) {
            Ok(entry) => entry,
            Err(error) => {
                tracing::warn!(store_id, %error, "discarding unreadable cache entry");
                self.remove(store_id);
                return None;
            }
        };

        if self.is_fresh(entry.timestamp, now) {
            tracing::debug!(
                store_id,
                age_secs = (now - entry.timestamp).num_seconds(),
                "cache hit"
            );
            Some(entry.data)
        } else {
            tracing::debug!(store_id, "cache entry expired");
            self.remove(store_id);
            None
        }
    }

    /// Unconditionally evicts the entry for a store
    pub fn remove(&self, store_id: &str) {
        if let Err(error) = self.storage.remove_item(&Self::key(store_id)) {
            tracing::warn!(store_id, %error, "failed to remove cache entry");
        }
    }

    /// Evicts every expired entry, returning how many were removed
    pub fn clear_expired(&self) -> usize {
        self.clear_expired_at(Utc::now())
    }

    /// Evicts every entry that is expired (or unreadable) at `now`
    pub fn clear_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        for key in self.storage.keys() {
            let Some(store_id) = key.strip_prefix(CACHE_KEY_PREFIX) else {
                continue;
            };
            let fresh = self
                .storage
                .get_item(&key)
                .and_then(|raw| serde_json::from_str::<CachedStore>(&raw).ok())
                .is_some_and(|entry| self.is_fresh(entry.timestamp, now));
            if !fresh {
                self.remove(store_id);
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(removed, "cleared expired cache entries");
        }
        removed
    }

    /// Evicts every cache entry regardless of age, returning how many were removed
    ///
    /// Other keys in the shared storage (e.g. favorites) are left untouched.
    pub fn clear_all(&self) -> usize {
        let mut removed = 0;
        for key in self.storage.keys() {
            if let Some(store_id) = key.strip_prefix(CACHE_KEY_PREFIX) {
                self.remove(store_id);
                removed += 1;
            }
        }
        removed
    }
}
