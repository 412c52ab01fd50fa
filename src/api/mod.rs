//! CoinGecko API client and response models
//!
//! The client routes every request through the disk cache, so repeated
//! queries within the cache TTL never reach the network.

pub mod client;
pub mod retry;

pub use client::{
    validate_coin_id, validate_history_date, ApiError, CoinGeckoClient, COINGECKO_BASE_URL,
};
pub use retry::{Backoff, RetryPolicy};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Prices keyed by coin id, then by quote currency
///
/// e.g. `{"bitcoin": {"usd": 50000.0}}`
pub type PriceTable = BTreeMap<String, BTreeMap<String, f64>>;

/// One row of the `coins/markets` listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCoin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    /// Price in the requested currency
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_rank: Option<u32>,
    /// 24 hour price change in percent
    pub price_change_percentage_24h: Option<f64>,
}

/// Snapshot returned by `coins/{id}/history`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinHistory {
    pub id: String,
    pub symbol: String,
    pub name: String,
    /// Missing when the coin has no data for the requested day
    pub market_data: Option<HistoryMarketData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMarketData {
    /// Price keyed by quote currency
    pub current_price: BTreeMap<String, f64>,
}

impl CoinHistory {
    /// Price in `currency` on the requested day, if reported
    pub fn price_in(&self, currency: &str) -> Option<f64> {
        self.market_data
            .as_ref()
            .and_then(|m| m.current_price.get(currency).copied())
    }
}
