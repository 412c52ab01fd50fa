//! Cache manager for persisting API responses to disk
//!
//! Provides a `CacheManager` that serializes all access to a [`DiskStore`]
//! behind one lock and applies a default TTL to writes that don't name one.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use super::error::Result;
use super::key::CacheKey;
use super::store::{CacheStats, DiskStore, StoreConfig};

/// Default time-to-live for entries, in seconds
pub const DEFAULT_TTL_SECONDS: u64 = 300;

/// Thread-safe view over the on-disk store
///
/// Clones share the same store and lock, so one manager can be built at
/// startup and handed to every component that needs caching. Every public
/// operation holds the lock for its whole duration; the guard is dropped on
/// return, including early returns through `?`.
///
/// Reads never fail: missing, expired, corrupt or undecodable entries come
/// back as `None`. Writes and deletes report storage errors.
#[derive(Debug, Clone)]
pub struct CacheManager {
    store: Arc<Mutex<DiskStore>>,
    default_ttl: u64,
}

impl CacheManager {
    /// Opens the store described by `config`
    ///
    /// Fails immediately if the directory is unusable rather than on first write.
    pub fn open(config: StoreConfig, default_ttl: u64) -> Result<Self> {
        let store = DiskStore::open(config)?;
        Ok(Self {
            store: Arc::new(Mutex::new(store)),
            default_ttl,
        })
    }

    /// Creates a CacheManager with a custom cache directory and default settings
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::open(StoreConfig::new(cache_dir), DEFAULT_TTL_SECONDS)
    }

    /// TTL applied by `set` when none is given
    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    /// Directory holding the cache files
    pub fn directory(&self) -> PathBuf {
        self.store.lock().directory().to_path_buf()
    }

    /// Stores `value` under `key`, replacing any existing entry
    ///
    /// # Arguments
    /// * `key` - Cache key or plain name (e.g., "btc_usd")
    /// * `value` - The data to cache (must implement Serialize)
    /// * `ttl` - Seconds until expiry; `None` uses the default TTL
    pub fn set<K, T>(&self, key: K, value: &T, ttl: Option<u64>) -> Result<()>
    where
        K: Into<CacheKey>,
        T: Serialize + ?Sized,
    {
        let key = key.into();
        let value = serde_json::to_value(value)?;
        let ttl = ttl.unwrap_or(self.default_ttl);

        let store = self.store.lock();
        store.put(&key, &value, ttl)
    }

    /// Returns the live value for `key`, or `None`
    pub fn get<K, T>(&self, key: K) -> Option<T>
    where
        K: Into<CacheKey>,
        T: DeserializeOwned,
    {
        let key = key.into();
        let found = {
            let store = self.store.lock();
            store.get(&key)
        };

        match found {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!(key = %key, error = %e, "cached value has unexpected shape");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Returns the live value for `key`, or `default`
    pub fn get_or<K, T>(&self, key: K, default: T) -> T
    where
        K: Into<CacheKey>,
        T: DeserializeOwned,
    {
        self.get(key).unwrap_or(default)
    }

    /// Removes `key`; removing an absent key succeeds
    pub fn delete<K: Into<CacheKey>>(&self, key: K) -> Result<()> {
        let key = key.into();
        let store = self.store.lock();
        store.delete(&key)
    }

    /// Removes every entry, returning how many were removed
    pub fn clear(&self) -> Result<usize> {
        self.store.lock().clear()
    }

    /// Whether a live entry exists for `key`
    pub fn contains<K: Into<CacheKey>>(&self, key: K) -> bool {
        let key = key.into();
        let result = self.store.lock().contains(&key);
        result.unwrap_or_else(|e| {
            warn!(key = %key, error = %e, "cache read failed, treating as miss");
            false
        })
    }

    /// Number of stored entries, counting expired ones not yet removed
    pub fn len(&self) -> Result<usize> {
        self.store.lock().size()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Physically removes expired entries, returning how many were removed
    pub fn expire(&self) -> Result<usize> {
        self.store.lock().expire()
    }

    /// Entry counts and disk usage
    pub fn stats(&self) -> Result<CacheStats> {
        self.store.lock().stats()
    }
}
