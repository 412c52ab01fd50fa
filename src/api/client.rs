//! CoinGecko API client
//!
//! Fetches prices, market listings and historical snapshots, retrying failed
//! requests per a [`RetryPolicy`] and caching successful responses.

use std::time::Duration;

use chrono::{Local, NaiveDate};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::retry::RetryPolicy;
use super::{CoinHistory, MarketCoin, PriceTable};
use crate::cache::{CacheError, CacheKey, CacheManager};

/// Base URL for the CoinGecko public API
pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How far back the free API serves history
const HISTORY_WINDOW_DAYS: i64 = 365;

/// Date format expected by the history endpoint
const HISTORY_DATE_FORMAT: &str = "%d-%m-%Y";

/// Errors that can occur when querying the API
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Request failed ({status}): {body}")]
    Status { status: u16, body: String },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Every attempt allowed by the retry policy failed
    #[error("Failed to fetch data from {url} after {attempts} attempts")]
    Connection { url: String, attempts: u32 },

    /// History date is not in dd-mm-yyyy form
    #[error("Invalid date '{0}': expected dd-mm-yyyy, e.g. 01-01-2025")]
    InvalidDate(String),

    /// Coin id that cannot be used as a URL path segment
    #[error("Invalid coin id '{0}': expected an id such as bitcoin or usd-coin")]
    InvalidCoinId(String),

    /// History date is older than the free API allows
    #[error("Date {0} is too old: the free API only serves the past 365 days")]
    DateOutOfRange(String),

    /// Cache write failed
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Client for the CoinGecko API with a disk cache in front
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Cache shared with the rest of the application
    cache: CacheManager,
    /// Base URL for the API (allows override for testing)
    base_url: String,
    retry: RetryPolicy,
    /// TTL for cached responses; `None` uses the cache default
    cache_ttl: Option<u64>,
}

impl CoinGeckoClient {
    /// Creates a client that caches through `cache` and times out requests after `timeout`
    pub fn new(cache: CacheManager, timeout: Duration) -> Result<Self, ApiError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            cache,
            base_url: COINGECKO_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            cache_ttl: None,
        })
    }

    /// Points the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Overrides the TTL for responses cached by this client
    pub fn with_cache_ttl(mut self, ttl: Option<u64>) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Full URL for an endpoint path such as `simple/price`
    fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Cache key identifying a request to `endpoint` with `params`
    pub fn cache_key(&self, endpoint: &str, params: &[(&str, String)]) -> CacheKey {
        CacheKey::new(
            self.endpoint_url(endpoint),
            params.iter().map(|(k, v)| (*k, v.clone())),
        )
    }

    /// Current prices of `ids` (comma separated) in `vs_currencies`
    pub async fn get_price(&self, ids: &str, vs_currencies: &str) -> Result<PriceTable, ApiError> {
        let params = [
            ("ids", ids.to_string()),
            ("vs_currencies", vs_currencies.to_string()),
        ];
        self.get_json("simple/price", &params).await
    }

    /// Top coins by market cap
    pub async fn get_market(
        &self,
        vs_currency: &str,
        per_page: u32,
        page: u32,
    ) -> Result<Vec<MarketCoin>, ApiError> {
        let params = [
            ("vs_currency", vs_currency.to_string()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
            ("sparkline", "false".to_string()),
        ];
        self.get_json("coins/markets", &params).await
    }

    /// Snapshot of `coin_id` on `date` (dd-mm-yyyy)
    ///
    /// The coin id and date are checked before the cache or network is
    /// touched.
    pub async fn get_history(&self, coin_id: &str, date: &str) -> Result<CoinHistory, ApiError> {
        validate_coin_id(coin_id)?;
        validate_history_date(date, Local::now().date_naive())?;

        let params = [("date", date.to_string())];
        self.get_json(&format!("coins/{}/history", coin_id), &params)
            .await
    }

    /// Serves `endpoint` from the cache, fetching and storing it on a miss
    async fn get_json<T>(&self, endpoint: &str, params: &[(&str, String)]) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned,
    {
        let url = self.endpoint_url(endpoint);
        let key = self.cache_key(endpoint, params);

        self.cache
            .fetch_or_compute_async(key, self.cache_ttl, || self.fetch_with_retry(&url, params))
            .await
    }

    /// Fetches and parses `url`, retrying per the client's policy
    async fn fetch_with_retry<T>(&self, url: &str, params: &[(&str, String)]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.fetch_once(url, params).await {
                Ok(data) => return Ok(data),
                Err(e) => warn!(url, attempt, max_attempts, error = %e, "request failed"),
            }

            match self.retry.delay_after(attempt) {
                Some(delay) => tokio::time::sleep(delay).await,
                None => {
                    return Err(ApiError::Connection {
                        url: url.to_string(),
                        attempts: attempt,
                    })
                }
            }
        }
    }

    /// Makes one request and parses the body
    async fn fetch_once<T>(&self, url: &str, params: &[(&str, String)]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        debug!(url, "requesting");
        let response = self.http_client.get(url).query(params).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

/// Checks a coin id is safe to place in a URL path
///
/// CoinGecko ids are made of ASCII letters, digits, `-`, `_` and `.`. Anything
/// else (slashes, `?`, `#`, `%`, whitespace) would change which endpoint is
/// requested, as would the `.` and `..` path segments.
pub fn validate_coin_id(coin_id: &str) -> Result<&str, ApiError> {
    let valid = !coin_id.is_empty()
        && coin_id != "."
        && coin_id != ".."
        && coin_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(ApiError::InvalidCoinId(coin_id.to_string()));
    }
    Ok(coin_id)
}

/// Checks a history date is `dd-mm-yyyy` and within the past 365 days of `today`
pub fn validate_history_date(date: &str, today: NaiveDate) -> Result<NaiveDate, ApiError> {
    let parsed = NaiveDate::parse_from_str(date, HISTORY_DATE_FORMAT)
        .map_err(|_| ApiError::InvalidDate(date.to_string()))?;

    if parsed < today - chrono::Duration::days(HISTORY_WINDOW_DAYS) {
        return Err(ApiError::DateOutOfRange(date.to_string()));
    }

    Ok(parsed)
}
