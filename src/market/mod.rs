//! Market data acquisition.
//!
//! Defines the `MarketDataProvider` trait and provides the Binance
//! USDT-margined futures implementation. Providers fail per-instrument:
//! an error for one symbol must never affect another.

pub mod binance;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::MarketSnapshot;

/// Abstraction over market snapshot sources.
///
/// Implementors return a bounded recent candle history plus the
/// current price for one instrument, or a per-instrument failure.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch a normalized snapshot for the given symbol.
    async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot>;

    /// Provider name for logging and identification.
    fn name(&self) -> &str;
}
