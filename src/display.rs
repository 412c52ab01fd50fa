//! Console rendering for query results and cache statistics

use std::io::{self, Write};
use std::path::Path;

use crossterm::style::Stylize;

use crate::api::{CoinHistory, MarketCoin, PriceTable};
use crate::cache::CacheStats;

/// Uppercases the first character, e.g. "bitcoin" -> "Bitcoin"
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Writes one line per coin with its price in `vs`
pub fn write_prices<W: Write>(out: &mut W, prices: &PriceTable, vs: &str) -> io::Result<()> {
    writeln!(out, "\n{}", "Current prices:".cyan().bold())?;
    if prices.is_empty() {
        writeln!(out, "{}", "No prices returned; check the coin ids".yellow())?;
    }
    for (coin, quotes) in prices {
        let line = match quotes.get(vs) {
            Some(price) => format!("{:<12}: {} {}", capitalize(coin), price, vs.to_uppercase()),
            None => format!("{:<12}: n/a {}", capitalize(coin), vs.to_uppercase()),
        };
        writeln!(out, "{}", line.green())?;
    }
    Ok(())
}

/// Formats a whole number with comma thousands separators, e.g. 1234567 -> "1,234,567"
pub fn group_thousands(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0.0 && digits != "0" {
        grouped.push('-');
    }
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Writes the market listing, colouring each row by its 24h change
pub fn write_market<W: Write>(out: &mut W, coins: &[MarketCoin], vs: &str) -> io::Result<()> {
    writeln!(out, "\n{}", format!("Top {} by market cap:", coins.len()).cyan().bold())?;
    writeln!(
        out,
        "{}",
        format!(
            "{:<12} {:>12} {:<5} {:>9}  {:>20}",
            "Coin", "Price", "", "24h", "Market cap"
        )
        .bold()
    )?;
    for coin in coins {
        let change = coin.price_change_percentage_24h.unwrap_or(0.0);
        let sign = if change >= 0.0 { "+" } else { "" };
        let price = coin
            .current_price
            .map(|p| format!("{:>12.2}", p))
            .unwrap_or_else(|| format!("{:>12}", "n/a"));
        let market_cap = coin
            .market_cap
            .map(group_thousands)
            .unwrap_or_else(|| "n/a".to_string());
        let line = format!(
            "{:<12} {} {:<5} {:>9}  {:>20}",
            coin.name,
            price,
            vs.to_uppercase(),
            format!("({}{:.2}%)", sign, change),
            market_cap
        );
        if change >= 0.0 {
            writeln!(out, "{}", line.green())?;
        } else {
            writeln!(out, "{}", line.red())?;
        }
    }
    Ok(())
}

/// Writes the price of a coin in `vs` on a past date
pub fn write_history<W: Write>(
    out: &mut W,
    coin: &str,
    date: &str,
    vs: &str,
    history: &CoinHistory,
) -> io::Result<()> {
    match history.price_in(vs) {
        Some(price) => writeln!(
            out,
            "{}",
            format!(
                "{} on {}: {} {}",
                capitalize(coin),
                date,
                price,
                vs.to_uppercase()
            )
            .magenta()
        ),
        None => writeln!(
            out,
            "{}",
            format!(
                "No {} price for {} on {}",
                vs.to_uppercase(),
                capitalize(coin),
                date
            )
            .yellow()
        ),
    }
}

/// Writes cache counts and disk usage
pub fn write_cache_stats<W: Write>(out: &mut W, dir: &Path, stats: &CacheStats) -> io::Result<()> {
    writeln!(out, "\n{}", "Cache:".cyan().bold())?;
    writeln!(out, "{:<12}: {}", "Directory", dir.display())?;
    writeln!(out, "{:<12}: {}", "Entries", stats.entries)?;
    writeln!(out, "{:<12}: {}", "Live", stats.live)?;
    writeln!(out, "{:<12}: {}", "Expired", stats.expired)?;
    if stats.unreadable > 0 {
        writeln!(out, "{:<12}: {}", "Unreadable", stats.unreadable.to_string().yellow())?;
    }
    writeln!(
        out,
        "{:<12}: {} / {} bytes",
        "Size", stats.volume, stats.size_limit
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::HistoryMarketData;
    use std::collections::BTreeMap;

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).expect("Rendering should succeed");
        String::from_utf8(buf).expect("Output should be UTF-8")
    }

    fn coin(name: &str, price: Option<f64>, change: Option<f64>) -> MarketCoin {
        MarketCoin {
            id: name.to_lowercase(),
            symbol: name[..3].to_lowercase(),
            name: name.to_string(),
            current_price: price,
            market_cap: price.map(|p| p * 19_700_000.0),
            market_cap_rank: None,
            price_change_percentage_24h: change,
        }
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("bitcoin"), "Bitcoin");
        assert_eq!(capitalize("Ethereum"), "Ethereum");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_write_prices() {
        let mut prices = PriceTable::new();
        prices.insert("bitcoin".into(), BTreeMap::from([("usd".to_string(), 50000.0)]));
        prices.insert("ethereum".into(), BTreeMap::new());

        let output = render(|out| write_prices(out, &prices, "usd"));

        assert!(output.contains("Bitcoin"));
        assert!(output.contains("50000 USD"));
        assert!(output.contains("n/a USD"));
    }

    #[test]
    fn test_write_prices_empty() {
        let output = render(|out| write_prices(out, &PriceTable::new(), "usd"));
        assert!(output.contains("No prices returned"));
    }

    #[test]
    fn test_write_market_formats_change() {
        let coins = vec![
            coin("Bitcoin", Some(50000.0), Some(1.5)),
            coin("Ethereum", Some(3000.0), Some(-2.25)),
            coin("Tether", None, None),
        ];

        let output = render(|out| write_market(out, &coins, "usd"));

        assert!(output.contains("Top 3 by market cap"));
        assert!(output.contains("50000.00"));
        assert!(output.contains("(+1.50%)"));
        assert!(output.contains("(-2.25%)"));
        assert!(output.contains("n/a"));
        assert!(output.contains("Market cap"));
        assert!(output.contains("985,000,000,000"));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1000.0), "1,000");
        assert_eq!(group_thousands(1_234_567.4), "1,234,567");
        assert_eq!(group_thousands(-45_000.0), "-45,000");
    }

    fn history_with(prices: &[(&str, f64)]) -> CoinHistory {
        CoinHistory {
            id: "bitcoin".into(),
            symbol: "btc".into(),
            name: "Bitcoin".into(),
            market_data: Some(HistoryMarketData {
                current_price: prices.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            }),
        }
    }

    #[test]
    fn test_write_history() {
        let history = history_with(&[("usd", 42000.5), ("eur", 39000.0)]);

        let output = render(|out| write_history(out, "bitcoin", "01-01-2025", "usd", &history));

        assert!(output.contains("Bitcoin on 01-01-2025: 42000.5 USD"));
    }

    #[test]
    fn test_write_history_in_other_currency() {
        let history = history_with(&[("usd", 42000.5), ("eur", 39000.0)]);

        let output = render(|out| write_history(out, "bitcoin", "01-01-2025", "eur", &history));

        assert!(output.contains("Bitcoin on 01-01-2025: 39000 EUR"));
        assert!(!output.contains("USD"));
    }

    #[test]
    fn test_write_history_missing_currency() {
        let history = history_with(&[("usd", 42000.5)]);

        let output = render(|out| write_history(out, "bitcoin", "01-01-2025", "jpy", &history));

        assert!(output.contains("No JPY price for Bitcoin on 01-01-2025"));
    }

    #[test]
    fn test_write_history_without_data() {
        let history = CoinHistory {
            id: "x".into(),
            symbol: "x".into(),
            name: "X".into(),
            market_data: None,
        };

        let output = render(|out| write_history(out, "x", "01-01-2025", "usd", &history));

        assert!(output.contains("No USD price"));
    }

    #[test]
    fn test_write_cache_stats() {
        let stats = CacheStats {
            entries: 3,
            live: 2,
            expired: 1,
            unreadable: 0,
            volume: 1234,
            size_limit: 1_000_000_000,
        };

        let output = render(|out| write_cache_stats(out, Path::new("/tmp/gecko"), &stats));

        assert!(output.contains("/tmp/gecko"));
        assert!(output.contains("1234 / 1000000000 bytes"));
        assert!(!output.contains("Unreadable"));
    }
}
