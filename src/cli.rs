//! Command-line interface parsing for geckocli
//!
//! Global flags configure the cache and HTTP client; subcommands select the
//! query. Every cache flag can also be set through an environment variable.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::api::COINGECKO_BASE_URL;
use crate::cache::{EvictionPolicy, DEFAULT_SIZE_LIMIT, DEFAULT_TTL_SECONDS};

/// Largest page the markets endpoint serves
pub const MAX_TOP: u32 = 250;

/// Interval for `market --refresh` given without a value
pub const DEFAULT_MARKET_REFRESH: u64 = 5;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// `--watch 0` or `--refresh 0` would poll in a tight loop
    #[error("Invalid watch interval: must be at least 1 second")]
    InvalidWatchInterval,

    /// `--top` outside what the API can return
    #[error("Invalid value for --top: {0} (expected 1-250)")]
    InvalidTop(u32),
}

/// geckocli - Query CoinGecko prices, markets and history
#[derive(Parser, Debug)]
#[command(name = "geckocli")]
#[command(about = "CoinGecko prices, markets and history with a local cache")]
#[command(version)]
pub struct Cli {
    /// Directory for cached responses
    #[arg(long, env = "GECKOCLI_CACHE_DIR", global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Seconds a cached response stays fresh
    #[arg(long, env = "GECKOCLI_CACHE_TTL", global = true, default_value_t = DEFAULT_TTL_SECONDS)]
    pub ttl: u64,

    /// Disk budget for the cache in bytes
    #[arg(long, env = "GECKOCLI_CACHE_SIZE_LIMIT", global = true, default_value_t = DEFAULT_SIZE_LIMIT)]
    pub size_limit: u64,

    /// What to drop when the disk budget is reached: least-recently-stored or none
    #[arg(long, env = "GECKOCLI_CACHE_EVICTION", global = true, default_value_t = EvictionPolicy::default())]
    pub eviction: EvictionPolicy,

    /// Attempts per request before giving up
    #[arg(long, global = true, default_value_t = 3)]
    pub retries: u32,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    pub timeout: u64,

    /// API root URL
    #[arg(long, env = "GECKOCLI_BASE_URL", global = true, default_value = COINGECKO_BASE_URL)]
    pub base_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Current price of one or more coins
    ///
    /// Example: geckocli price bitcoin,ethereum --vs eur
    Price {
        /// Comma separated coin ids
        ids: String,
        /// Quote currency
        #[arg(long, default_value = "usd")]
        vs: String,
        /// Refresh every SECS seconds until interrupted
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },
    /// Top coins by market cap
    Market {
        /// Number of coins to list
        #[arg(long, default_value_t = 10)]
        top: u32,
        /// Quote currency
        #[arg(long, default_value = "usd")]
        vs: String,
        /// Refresh every SECS seconds (5 if no value is given) until interrupted
        #[arg(
            long,
            value_name = "SECS",
            num_args = 0..=1,
            default_missing_value = "5"
        )]
        refresh: Option<u64>,
    },
    /// Price of a coin on a past date
    ///
    /// Example: geckocli history bitcoin 01-01-2025 --vs eur
    History {
        /// Coin id
        coin: String,
        /// Date as dd-mm-yyyy, within the past 365 days
        date: String,
        /// Quote currency
        #[arg(long, default_value = "usd")]
        vs: String,
    },
    /// Inspect or maintain the local cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// Show entry counts and disk usage
    Stats,
    /// Remove every cached response
    Clear,
    /// Remove expired responses
    Expire,
}

impl Cli {
    /// Rejects argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), CliError> {
        match &self.command {
            Command::Price { watch: Some(0), .. } | Command::Market { refresh: Some(0), .. } => {
                Err(CliError::InvalidWatchInterval)
            }
            Command::Market { top, .. } if *top == 0 || *top > MAX_TOP => {
                Err(CliError::InvalidTop(*top))
            }
            _ => Ok(()),
        }
    }
}
