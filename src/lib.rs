//! geckocli library
//!
//! Disk-cached access to the CoinGecko API, exposed for the binary and for
//! integration tests.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod display;
pub mod watch;
