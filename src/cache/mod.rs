//! Local persistence for store details and user favorites
//!
//! This module provides a browser-style key/value store backed by JSON files on
//! disk (`LocalStorage`) and a time-bounded store detail cache (`StoreCache`)
//! built on top of it. Cache entries are only valid for 30 minutes; expired or
//! unreadable entries behave like misses and are evicted when encountered.

mod storage;
mod store_cache;

pub use storage::LocalStorage;
pub use store_cache::{StoreCache, CACHE_KEY_PREFIX, CACHE_TTL_MINUTES};
