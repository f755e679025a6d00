//! Strategy evaluators.
//!
//! Defines the `StrategyEvaluator` trait and the four built-in
//! detectors. Evaluators are pure functions of a market snapshot:
//! stateless, mutually independent, registered once at startup. An
//! evaluator failure is isolated by the scan engine and never affects
//! its siblings.

pub mod breakout;
pub mod momentum;
pub mod range;
pub mod trend;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::types::{Candle, MarketSnapshot, SignalCategory, Verdict};

/// Abstraction over opportunity detectors.
#[async_trait]
pub trait StrategyEvaluator: Send + Sync {
    /// Strategy name for logging and identification.
    fn name(&self) -> &str;

    /// The category this evaluator's verdicts carry.
    fn category(&self) -> SignalCategory;

    /// Evaluate a snapshot: `Ok(Some(verdict))` when a setup exists,
    /// `Ok(None)` when it doesn't, `Err` on evaluator failure.
    async fn evaluate(&self, snapshot: &MarketSnapshot) -> Result<Option<Verdict>>;
}

/// The full built-in evaluator set, with default parameters.
pub fn default_evaluators() -> Vec<Arc<dyn StrategyEvaluator>> {
    vec![
        Arc::new(momentum::MomentumMaster::default()),
        Arc::new(breakout::BreakoutPro::default()),
        Arc::new(trend::TrendFollowing::default()),
        Arc::new(range::BreakoutTrading::default()),
    ]
}

// ---------------------------------------------------------------------------
// Indicator helpers
// ---------------------------------------------------------------------------

/// Simple moving average over the trailing `period` values.
pub(crate) fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    Some(values[values.len() - period..].iter().sum::<f64>() / period as f64)
}

/// Percent change over the trailing `period` bars.
pub(crate) fn rate_of_change(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period + 1 {
        return None;
    }
    let past = values[values.len() - 1 - period];
    let last = values[values.len() - 1];
    if past.abs() < f64::EPSILON {
        return None;
    }
    Some((last - past) / past * 100.0)
}

/// Simple (non-smoothed) RSI over the trailing `period` bar deltas.
/// Returns 100 when there are no losses in the window.
pub(crate) fn rsi(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period + 1 {
        return None;
    }
    let window = &values[values.len() - period - 1..];
    let mut gains = 0.0;
    let mut losses = 0.0;
    for pair in window.windows(2) {
        let delta = pair[1] - pair[0];
        if delta >= 0.0 {
            gains += delta;
        } else {
            losses -= delta;
        }
    }
    if losses == 0.0 {
        return Some(100.0);
    }
    let rs = gains / losses;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Highest high across the given candles.
pub(crate) fn highest_high(candles: &[Candle]) -> Option<f64> {
    candles.iter().map(|c| c.high).fold(None, |acc, h| {
        Some(acc.map_or(h, |a: f64| a.max(h)))
    })
}

/// Lowest low across the given candles.
pub(crate) fn lowest_low(candles: &[Candle]) -> Option<f64> {
    candles.iter().map(|c| c.low).fold(None, |acc, l| {
        Some(acc.map_or(l, |a: f64| a.min(l)))
    })
}

/// Mean high-low range across the given candles.
pub(crate) fn average_range(candles: &[Candle]) -> Option<f64> {
    if candles.is_empty() {
        return None;
    }
    Some(candles.iter().map(|c| c.range()).sum::<f64>() / candles.len() as f64)
}

/// Mean volume across the given candles.
pub(crate) fn average_volume(candles: &[Candle]) -> Option<f64> {
    if candles.is_empty() {
        return None;
    }
    Some(candles.iter().map(|c| c.volume).sum::<f64>() / candles.len() as f64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
