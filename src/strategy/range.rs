//! Breakout Trading — volatility-contraction breakout.
//!
//! Looks for a tight recent range after a wider base, then fires when
//! the latest close escapes the contraction. The far side of the
//! contraction is the stop. Maps to the default day-long expiry class.

use anyhow::Result;
use async_trait::async_trait;

use super::{average_range, highest_high, lowest_low, StrategyEvaluator};
use crate::types::{Direction, MarketSnapshot, SignalCategory, Verdict};

/// Tunables for the contraction-breakout detector.
#[derive(Debug, Clone)]
pub struct RangeConfig {
    /// Bars forming the wide base.
    pub base_period: usize,
    /// Bars forming the contraction (latest bar excluded).
    pub squeeze_period: usize,
    /// Contraction average range must stay below this fraction of the
    /// base average range.
    pub squeeze_factor: f64,
    pub reward_ratio: f64,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            base_period: 20,
            squeeze_period: 5,
            squeeze_factor: 0.7,
            reward_ratio: 2.0,
        }
    }
}

/// Contraction-breakout detector.
#[derive(Debug, Default)]
pub struct BreakoutTrading {
    config: RangeConfig,
}

impl BreakoutTrading {
    pub fn new(config: RangeConfig) -> Self {
        Self { config }
    }

    fn detect(&self, snapshot: &MarketSnapshot) -> Option<Verdict> {
        let candles = &snapshot.candles;
        let needed = self.config.base_period + self.config.squeeze_period + 1;
        if candles.len() < needed {
            return None;
        }

        let latest = candles.last()?;
        let squeeze_end = candles.len() - 1;
        let squeeze_start = squeeze_end - self.config.squeeze_period;
        let squeeze = &candles[squeeze_start..squeeze_end];
        let base = &candles[squeeze_start - self.config.base_period..squeeze_start];

        let base_avg = average_range(base)?;
        let squeeze_avg = average_range(squeeze)?;
        if base_avg <= 0.0 {
            return None;
        }
        let ratio = squeeze_avg / base_avg;
        if ratio > self.config.squeeze_factor {
            return None;
        }

        let ceiling = highest_high(squeeze)?;
        let floor = lowest_low(squeeze)?;
        let entry = snapshot.current_price;

        let (direction, stop_loss) = if latest.close > ceiling {
            (Direction::Long, floor)
        } else if latest.close < floor {
            (Direction::Short, ceiling)
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

        // Tighter squeezes score higher.
        let confidence = 60.0 + ((self.config.squeeze_factor - ratio) * 50.0).clamp(0.0, 25.0);

        Some(Verdict {
            category: SignalCategory::BreakoutTrading,
            direction,
            entry,
            stop_loss,
            take_profit,
            confidence,
        })
    }
}

#[async_trait]
impl StrategyEvaluator for BreakoutTrading {
    fn name(&self) -> &str {
        "Breakout Trading"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::BreakoutTrading
    }

    async fn evaluate(&self, snapshot: &MarketSnapshot) -> Result<Option<Verdict>> {
        Ok(self.detect(snapshot))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
