//! Cache module for storing API responses to disk
//!
//! Responses are kept as JSON files under one directory with a per-entry
//! expiry. Expired entries are never returned; they are removed lazily, by
//! `expire`, or when the size limit forces eviction of the oldest writes.

mod error;
mod fetch;
mod key;
mod manager;
mod store;

pub use error::{CacheError, Result};
pub use key::CacheKey;
pub use manager::{CacheManager, DEFAULT_TTL_SECONDS};
pub use store::{CacheStats, DiskStore, EvictionPolicy, StoreConfig, DEFAULT_SIZE_LIMIT};
