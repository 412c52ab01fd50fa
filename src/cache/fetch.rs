//! Fetch-or-compute: serve fresh cached values, otherwise produce and store them

use std::future::Future;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::error::CacheError;
use super::key::CacheKey;
use super::manager::CacheManager;

impl CacheManager {
    /// Returns the cached value for `key`, or computes, stores and returns it
    ///
    /// `compute` runs only on a miss, at most once. If it fails the error is
    /// returned as-is and nothing is written. The lock is not held while
    /// `compute` runs, so concurrent misses on one key may each compute; the
    /// last write wins.
    ///
    /// # Arguments
    /// * `key` - Cache key for the request
    /// * `ttl` - Seconds until expiry; `None` uses the default TTL
    /// * `compute` - Produces the value on a miss
    pub fn fetch_or_compute<K, T, E, F>(&self, key: K, ttl: Option<u64>, compute: F) -> Result<T, E>
    where
        K: Into<CacheKey>,
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Result<T, E>,
    {
        let key = key.into();
        if let Some(hit) = self.get(&key) {
            debug!(key = %key, "cache hit");
            return Ok(hit);
        }

        debug!(key = %key, "cache miss, computing");
        let value = compute()?;
        self.set(&key, &value, ttl)?;
        Ok(value)
    }

    /// Async form of [`fetch_or_compute`](Self::fetch_or_compute) for network fetches
    pub async fn fetch_or_compute_async<K, T, E, F, Fut>(
        &self,
        key: K,
        ttl: Option<u64>,
        compute: F,
    ) -> Result<T, E>
    where
        K: Into<CacheKey>,
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = key.into();
        if let Some(hit) = self.get(&key) {
            debug!(key = %key, "cache hit");
            return Ok(hit);
        }

        debug!(key = %key, "cache miss, fetching");
        let value = compute().await?;
        self.set(&key, &value, ttl)?;
        Ok(value)
    }
}
