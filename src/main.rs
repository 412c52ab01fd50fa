//! geckocli - Query CoinGecko prices, markets and history
//!
//! Responses are cached on disk so repeated queries within the cache TTL
//! don't hit the network.

use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use crossterm::style::Stylize;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use geckocli::api::CoinGeckoClient;
use geckocli::cache::CacheManager;
use geckocli::cli::{CacheAction, Cli, Command};
use geckocli::config::Config;
use geckocli::display;
use geckocli::watch::{watch_market, watch_prices};

/// Logs go to stderr so they never mix with command output.
/// Defaults to warnings only; override with RUST_LOG.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "geckocli=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Failures are printed as `[ERROR] <message>` on stderr with exit status 1
#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("[ERROR] {}", e).red());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    cli.validate()?;
    let config = Config::from_cli(&cli);
    debug!(?config, "configuration loaded");

    // Opening the cache checks the directory up front
    let cache = CacheManager::open(config.store_config(), config.cache_ttl)?;
    let mut stdout = io::stdout();

    match cli.command {
        Command::Cache { action } => run_cache_action(&cache, action, &mut stdout)?,
        command => {
            let client = CoinGeckoClient::new(cache, config.timeout)?
                .with_base_url(config.base_url.clone())
                .with_retry(config.retry_policy());
            run_query(&client, &config, command, &mut stdout).await?;
        }
    }

    Ok(())
}

async fn run_query<W: Write>(
    client: &CoinGeckoClient,
    config: &Config,
    command: Command,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Price {
            ids,
            vs,
            watch: Some(secs),
        } => {
            // Keep cached prices no older than one refresh interval
            let client = client.clone().with_cache_ttl(Some(secs.min(config.cache_ttl)));
            watch_prices(&client, &ids, &vs, Duration::from_secs(secs), out, ctrl_c()).await?;
        }
        Command::Price { ids, vs, watch: None } => {
            let prices = client.get_price(&ids, &vs).await?;
            display::write_prices(out, &prices, &vs)?;
        }
        Command::Market {
            top,
            vs,
            refresh: Some(secs),
        } => {
            let client = client.clone().with_cache_ttl(Some(secs.min(config.cache_ttl)));
            watch_market(&client, top, &vs, Duration::from_secs(secs), out, ctrl_c()).await?;
        }
        Command::Market {
            top,
            vs,
            refresh: None,
        } => {
            let coins = client.get_market(&vs, top, 1).await?;
            display::write_market(out, &coins, &vs)?;
        }
        Command::History { coin, date, vs } => {
            let history = client.get_history(&coin, &date).await?;
            display::write_history(out, &coin, &date, &vs, &history)?;
        }
        Command::Cache { action } => run_cache_action(client.cache(), action, out)?,
    }
    Ok(())
}

/// Resolves on Ctrl+C
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        debug!(error = %e, "could not listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

fn run_cache_action<W: Write>(
    cache: &CacheManager,
    action: CacheAction,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        CacheAction::Stats => {
            let stats = cache.stats()?;
            display::write_cache_stats(out, &cache.directory(), &stats)?;
        }
        CacheAction::Clear => {
            let removed = cache.clear()?;
            writeln!(out, "{}", format!("Removed {} cached entries", removed).green())?;
        }
        CacheAction::Expire => {
            let removed = cache.expire()?;
            writeln!(out, "{}", format!("Removed {} expired entries", removed).green())?;
        }
    }
    Ok(())
}
