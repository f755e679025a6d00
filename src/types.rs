//! Shared types for the SPOTTER scanner.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that market, strategy,
//! store, and engine modules can depend on them without
//! circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::policy;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// The opposite direction.
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// Strategy category that produced a signal.
///
/// The category determines the signal's expiry window through the
/// `policy` module. Records persisted with a category name this build
/// doesn't know rehydrate as `Unknown` and fall into the default
/// (longer) expiry class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalCategory {
    MomentumMaster,
    BreakoutPro,
    TrendFollowing,
    BreakoutTrading,
    Unknown,
}

impl SignalCategory {
    /// All known categories (useful for iteration).
    pub const ALL: &'static [SignalCategory] = &[
        SignalCategory::MomentumMaster,
        SignalCategory::BreakoutPro,
        SignalCategory::TrendFollowing,
        SignalCategory::BreakoutTrading,
    ];

    /// Canonical display name, also used as the persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalCategory::MomentumMaster => "Momentum Master",
            SignalCategory::BreakoutPro => "Breakout Pro",
            SignalCategory::TrendFollowing => "Trend Following",
            SignalCategory::BreakoutTrading => "Breakout Trading",
            SignalCategory::Unknown => "Unknown",
        }
    }

    /// Underscore form for use inside signal ids.
    pub fn slug(&self) -> String {
        self.as_str().replace(' ', "_")
    }

    /// Parse a persisted category name. Unrecognized names map to
    /// `Unknown` rather than failing, so old or foreign records load.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Momentum Master" => SignalCategory::MomentumMaster,
            "Breakout Pro" => SignalCategory::BreakoutPro,
            "Trend Following" => SignalCategory::TrendFollowing,
            "Breakout Trading" => SignalCategory::BreakoutTrading,
            _ => SignalCategory::Unknown,
        }
    }
}

impl fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for SignalCategory {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SignalCategory {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(SignalCategory::from_name(&name))
    }
}

// ---------------------------------------------------------------------------
// Market data
// ---------------------------------------------------------------------------

/// A single OHLCV bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: DateTime<Utc>,
}

impl Candle {
    /// Full high-low range of the bar.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Whether the bar closed above its open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// Normalized market snapshot for one instrument: a bounded recent
/// candle history plus the current price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    /// Oldest first.
    pub candles: Vec<Candle>,
    pub current_price: f64,
    pub as_of: DateTime<Utc>,
}

impl MarketSnapshot {
    /// Closing prices in candle order.
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// The most recent candle, if any.
    pub fn latest(&self) -> Option<&Candle> {
        self.candles.last()
    }
}

impl fmt::Display for MarketSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {:.4} ({} bars, as of {})",
            self.symbol,
            self.current_price,
            self.candles.len(),
            self.as_of.to_rfc3339(),
        )
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// A positive evaluator result: the trade parameters for one detected
/// opportunity. The evaluating strategy fills in its own category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub category: SignalCategory,
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Conventionally 0–100.
    pub confidence: f64,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} entry={:.4} sl={:.4} tp={:.4} conf={:.0}%",
            self.category, self.direction, self.entry, self.stop_loss, self.take_profit, self.confidence,
        )
    }
}

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

/// Deterministic signal id: symbol + category + creation instant.
/// Unique even under same-millisecond creation for different
/// `(symbol, category)` pairs because both appear in the id.
pub fn make_signal_id(symbol: &str, category: SignalCategory, at: DateTime<Utc>) -> String {
    format!("{}_{}_{}", symbol, category.slug(), at.timestamp_millis())
}

/// The central entity: one detected trading opportunity.
///
/// Immutable after acceptance into the store; destroyed by explicit
/// deletion or the expiry sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub symbol: String,
    pub category: SignalCategory,
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

impl Signal {
    /// Assemble a candidate signal from an evaluator verdict.
    pub fn from_verdict(symbol: &str, verdict: &Verdict, created_at: DateTime<Utc>) -> Self {
        Signal {
            id: make_signal_id(symbol, verdict.category, created_at),
            symbol: symbol.to_string(),
            category: verdict.category,
            direction: verdict.direction,
            entry: verdict.entry,
            stop_loss: verdict.stop_loss,
            take_profit: verdict.take_profit,
            confidence: verdict.confidence,
            created_at,
        }
    }

    /// Age of the signal at `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }

    /// Whether the signal has outlived its category's expiry window.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.age(now) >= policy::expiry(self.category)
    }

    /// Whether the signal still counts as freshly discovered.
    pub fn is_new(&self, now: DateTime<Utc>) -> bool {
        self.age(now) < policy::freshness_window()
    }

    /// Reward-to-risk ratio implied by entry, stop, and target.
    /// `None` when the stop is on the wrong side of the entry
    /// (non-positive risk).
    pub fn risk_reward(&self) -> Option<f64> {
        let (risk, reward) = match self.direction {
            Direction::Long => (self.entry - self.stop_loss, self.take_profit - self.entry),
            Direction::Short => (self.stop_loss - self.entry, self.entry - self.take_profit),
        };
        if risk > 0.0 {
            Some(reward / risk)
        } else {
            None
        }
    }

    /// Whether entry lies between stop and target in the stated
    /// direction. Checked at ingestion as a logged sanity warning,
    /// never a rejection.
    pub fn geometry_ok(&self) -> bool {
        match self.direction {
            Direction::Long => self.stop_loss < self.entry && self.entry < self.take_profit,
            Direction::Short => self.take_profit < self.entry && self.entry < self.stop_loss,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} entry={:.4} sl={:.4} tp={:.4} conf={:.0}%",
            self.symbol, self.category, self.direction, self.entry, self.stop_loss, self.take_profit, self.confidence,
        )
    }
}

// ---------------------------------------------------------------------------
// Scan report
// ---------------------------------------------------------------------------

/// Summary of a single full-universe scan cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub symbols_scanned: usize,
    pub snapshot_failures: usize,
    /// Positive verdicts produced across all evaluators.
    pub candidates: usize,
    pub accepted: usize,
    pub duplicates: usize,
}

impl ScanReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        ScanReport {
            started_at,
            symbols_scanned: 0,
            snapshot_failures: 0,
            candidates: 0,
            accepted: 0,
            duplicates: 0,
        }
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scanned={} failures={} candidates={} accepted={} duplicates={}",
            self.symbols_scanned, self.snapshot_failures, self.candidates, self.accepted, self.duplicates,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for SPOTTER.
#[derive(Debug, thiserror::Error)]
pub enum SpotterError {
    #[error("Provider error ({symbol}): {message}")]
    Provider { symbol: String, message: String },

    #[error("Evaluator error ({strategy}): {message}")]
    Evaluator { strategy: String, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
