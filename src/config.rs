//! Runtime configuration
//!
//! Collects the cache and HTTP settings from parsed CLI arguments (which
//! already fold in environment variables) into one place.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

use crate::api::client::DEFAULT_TIMEOUT;
use crate::api::{RetryPolicy, COINGECKO_BASE_URL};
use crate::cache::{EvictionPolicy, StoreConfig, DEFAULT_SIZE_LIMIT, DEFAULT_TTL_SECONDS};
use crate::cli::Cli;

/// Settings for the cache and API client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory for cached responses
    pub cache_dir: PathBuf,
    /// Default TTL for cached responses in seconds
    pub cache_ttl: u64,
    /// Disk budget for the cache in bytes
    pub size_limit: u64,
    pub eviction_policy: EvictionPolicy,
    /// Attempts per request
    pub retries: u32,
    /// Per-request timeout
    pub timeout: Duration,
    /// API root URL
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            cache_ttl: DEFAULT_TTL_SECONDS,
            size_limit: DEFAULT_SIZE_LIMIT,
            eviction_policy: EvictionPolicy::default(),
            retries: 3,
            timeout: DEFAULT_TIMEOUT,
            base_url: COINGECKO_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Creates a Config from parsed CLI arguments
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            cache_dir: cli.cache_dir.clone().unwrap_or_else(default_cache_dir),
            cache_ttl: cli.ttl,
            size_limit: cli.size_limit,
            eviction_policy: cli.eviction,
            retries: cli.retries,
            timeout: Duration::from_secs(cli.timeout),
            base_url: cli.base_url.clone(),
        }
    }

    /// Store settings derived from this config
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(&self.cache_dir)
            .with_size_limit(self.size_limit)
            .with_eviction_policy(self.eviction_policy)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries)
    }
}

/// XDG cache directory (`~/.cache/geckocli/` on Linux), or `./.cache` when
/// no home directory can be determined
pub fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("", "", "geckocli")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".cache"))
}
