//! Periodic refresh for `price --watch` and `market --refresh`
//!
//! Re-queries on a fixed interval until the shutdown future resolves.
//! Responses still go through the cache, so a refresh interval shorter than
//! the cache TTL shows cached data.

use std::future::Future;
use std::io::{self, Write};
use std::time::Duration;

use chrono::Local;
use crossterm::style::Stylize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::api::{ApiError, CoinGeckoClient};
use crate::display::{write_market, write_prices};

/// Runs `fetch` every `every` and renders each result until `shutdown` completes
///
/// The first refresh happens immediately. A failed refresh is reported and
/// the loop carries on with the next tick. A fetch still in flight when
/// `shutdown` completes (for example one sleeping between retries) is
/// dropped.
///
/// # Returns
/// The number of refreshes that completed
pub async fn watch<W, S, T, F, Fut, R>(
    every: Duration,
    out: &mut W,
    shutdown: S,
    mut fetch: F,
    mut render: R,
) -> io::Result<u64>
where
    W: Write,
    S: Future<Output = ()>,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
    R: FnMut(&mut W, &T) -> io::Result<()>,
{
    tokio::pin!(shutdown);
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut refreshes = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let result = tokio::select! {
                    result = fetch() => result,
                    _ = &mut shutdown => {
                        debug!("shutdown during refresh");
                        return Ok(refreshes);
                    }
                };
                refreshes += 1;
                match result {
                    Ok(data) => {
                        render(out, &data)?;
                        let stamp = format!("Updated {}", Local::now().format("%H:%M:%S"));
                        writeln!(out, "{}", stamp.dark_grey())?;
                    }
                    Err(e) => {
                        warn!(error = %e, "refresh failed");
                        writeln!(out, "{}", format!("[WARN] Refresh failed: {}", e).yellow())?;
                    }
                }
                out.flush()?;
            }
            _ = &mut shutdown => {
                return Ok(refreshes);
            }
        }
    }
}

/// Renders prices of `ids` every `every` until `shutdown` completes
pub async fn watch_prices<W, S>(
    client: &CoinGeckoClient,
    ids: &str,
    vs: &str,
    every: Duration,
    out: &mut W,
    shutdown: S,
) -> io::Result<u64>
where
    W: Write,
    S: Future<Output = ()>,
{
    watch(
        every,
        out,
        shutdown,
        || client.get_price(ids, vs),
        |out, prices| write_prices(out, prices, vs),
    )
    .await
}

/// Renders the top `top` coins every `every` until `shutdown` completes
pub async fn watch_market<W, S>(
    client: &CoinGeckoClient,
    top: u32,
    vs: &str,
    every: Duration,
    out: &mut W,
    shutdown: S,
) -> io::Result<u64>
where
    W: Write,
    S: Future<Output = ()>,
{
    watch(
        every,
        out,
        shutdown,
        || client.get_market(vs, top, 1),
        |out, coins| write_market(out, coins, vs),
    )
    .await
}
