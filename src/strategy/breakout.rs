//! Breakout Pro — N-bar high/low breakout with volume confirmation.
//!
//! Fires when the latest close clears the prior lookback's extreme on
//! elevated volume. The broken level becomes the stop. Short-lived:
//! maps to the one-hour expiry class.

use anyhow::Result;
use async_trait::async_trait;

use super::{average_volume, highest_high, lowest_low, StrategyEvaluator};
use crate::types::{Direction, MarketSnapshot, SignalCategory, Verdict};

/// Tunables for the breakout detector.
#[derive(Debug, Clone)]
pub struct BreakoutConfig {
    /// Prior bars forming the level to break (latest bar excluded).
    pub lookback: usize,
    /// Latest volume must exceed this multiple of the prior average.
    pub volume_factor: f64,
    pub reward_ratio: f64,
}

impl Default for BreakoutConfig {
    fn default() -> Self {
        Self {
            lookback: 20,
            volume_factor: 1.3,
            reward_ratio: 2.0,
        }
    }
}

/// Level-break detector.
#[derive(Debug, Default)]
pub struct BreakoutPro {
    config: BreakoutConfig,
}

impl BreakoutPro {
    pub fn new(config: BreakoutConfig) -> Self {
        Self { config }
    }

    fn detect(&self, snapshot: &MarketSnapshot) -> Option<Verdict> {
        let candles = &snapshot.candles;
        if candles.len() < self.config.lookback + 1 {
            return None;
        }

        let latest = candles.last()?;
        let prior = &candles[candles.len() - 1 - self.config.lookback..candles.len() - 1];

        let avg_volume = average_volume(prior)?;
        if avg_volume <= 0.0 {
            return None;
        }
        let volume_ratio = latest.volume / avg_volume;
        if volume_ratio < self.config.volume_factor {
            return None;
        }

        let resistance = highest_high(prior)?;
        let support = lowest_low(prior)?;
        let entry = snapshot.current_price;

        let (direction, stop_loss) = if latest.close > resistance {
            // Broken resistance becomes the stop.
            (Direction::Long, resistance)
        } else if latest.close < support {
            (Direction::Short, support)
        } else {
            return None;
        };

        let risk = match direction {
            Direction::Long => entry - stop_loss,
            Direction::Short => stop_loss - entry,
        };
        if risk <= 0.0 {
            return None;
        }

        let take_profit = match direction {
            Direction::Long => entry + self.config.reward_ratio * risk,
            Direction::Short => entry - self.config.reward_ratio * risk,
        };

        let confidence =
            60.0 + ((volume_ratio - self.config.volume_factor) * 20.0).clamp(0.0, 30.0);

        Some(Verdict {
            category: SignalCategory::BreakoutPro,
            direction,
            entry,
            stop_loss,
            take_profit,
            confidence,
        })
    }
}

#[async_trait]
impl StrategyEvaluator for BreakoutPro {
    fn name(&self) -> &str {
        "Breakout Pro"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::BreakoutPro
    }

    async fn evaluate(&self, snapshot: &MarketSnapshot) -> Result<Option<Verdict>> {
        Ok(self.detect(snapshot))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
