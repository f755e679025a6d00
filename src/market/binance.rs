//! Binance USDT-margined futures market data.
//!
//! Read-only kline (candlestick) client over the public REST API.
//! No authentication required for market data.
//!
//! API docs: https://binance-docs.github.io/apidocs/futures/en/
//! Base URL: https://fapi.binance.com
//! Rate limit: weight-based per IP; the scanner paces its own calls.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::debug;

use super::MarketDataProvider;
use crate::types::{Candle, MarketSnapshot, SpotterError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://fapi.binance.com";
const PROVIDER_NAME: &str = "binance-futures";

/// A raw kline row as Binance returns it: a 12-element array of mixed
/// numbers and numeric strings. Only the OHLCV fields are used.
type RawKline = (
    i64,    // open time (ms)
    String, // open
    String, // high
    String, // low
    String, // close
    String, // volume
    i64,    // close time (ms)
    String, // quote asset volume
    u64,    // number of trades
    String, // taker buy base volume
    String, // taker buy quote volume
    String, // ignore
);

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Binance futures kline client.
pub struct BinanceFuturesClient {
    http: Client,
    base_url: String,
    interval: String,
    limit: u32,
}

impl BinanceFuturesClient {
    /// Create a new client fetching `limit` bars of the given kline
    /// interval (e.g. "15m") per snapshot.
    pub fn new(interval: &str, limit: u32) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build Binance HTTP client")?;

        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            interval: interval.to_string(),
            limit,
        })
    }

    /// Override the base URL (for pointing at a local stub).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Convert raw kline rows into a normalized snapshot.
    fn snapshot_from_klines(
        symbol: &str,
        rows: Vec<RawKline>,
        as_of: DateTime<Utc>,
    ) -> Result<MarketSnapshot> {
        if rows.is_empty() {
            return Err(SpotterError::Provider {
                symbol: symbol.to_string(),
                message: "empty kline response".to_string(),
            }
            .into());
        }

        let parse = |value: &str, field: &str| -> Result<f64> {
            value
                .parse::<f64>()
                .context(format!("Failed to parse kline {field} for {symbol}: {value}"))
        };

        let mut candles = Vec::with_capacity(rows.len());
        for row in &rows {
            candles.push(Candle {
                open_time: DateTime::from_timestamp_millis(row.0)
                    .context(format!("Out-of-range kline open time for {symbol}"))?,
                open: parse(&row.1, "open")?,
                high: parse(&row.2, "high")?,
                low: parse(&row.3, "low")?,
                close: parse(&row.4, "close")?,
                volume: parse(&row.5, "volume")?,
                close_time: DateTime::from_timestamp_millis(row.6)
                    .context(format!("Out-of-range kline close time for {symbol}"))?,
            });
        }

        let current_price = candles
            .last()
            .map(|c| c.close)
            .unwrap_or_default();

        Ok(MarketSnapshot {
            symbol: symbol.to_string(),
            candles,
            current_price,
            as_of,
        })
    }
}

#[async_trait]
impl MarketDataProvider for BinanceFuturesClient {
    async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot> {
        let url = format!("{}/fapi/v1/klines", self.base_url);
        let limit = self.limit.to_string();

        let rows: Vec<RawKline> = self
            .http
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", self.interval.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .context(format!("Kline request failed for {symbol}"))?
            .error_for_status()
            .context(format!("Kline request rejected for {symbol}"))?
            .json()
            .await
            .context(format!("Failed to decode kline response for {symbol}"))?;

        debug!(symbol, bars = rows.len(), "Klines fetched");
        Self::snapshot_from_klines(symbol, rows, Utc::now())
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
