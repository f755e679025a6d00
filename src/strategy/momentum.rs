//! Momentum Master — rate-of-change momentum with RSI confirmation.
//!
//! Fires when price has moved sharply over the lookback and RSI agrees
//! with the move's direction. Short-lived by nature: its category maps
//! to the one-hour expiry class.

use anyhow::Result;
use async_trait::async_trait;

use super::{lowest_low, highest_high, rate_of_change, rsi, StrategyEvaluator};
use crate::types::{Direction, MarketSnapshot, SignalCategory, Verdict};

/// Tunables for the momentum detector.
#[derive(Debug, Clone)]
pub struct MomentumConfig {
    /// Bars for the rate-of-change lookback (also the stop lookback).
    pub roc_period: usize,
    pub rsi_period: usize,
    /// Minimum absolute rate of change, in percent.
    pub min_roc_pct: f64,
    /// Reward multiple of risk for the target.
    pub reward_ratio: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            roc_period: 10,
            rsi_period: 14,
            min_roc_pct: 1.5,
            reward_ratio: 2.0,
        }
    }
}

/// Momentum continuation detector.
#[derive(Debug, Default)]
pub struct MomentumMaster {
    config: MomentumConfig,
}

impl MomentumMaster {
    pub fn new(config: MomentumConfig) -> Self {
        Self { config }
    }

    fn detect(&self, snapshot: &MarketSnapshot) -> Option<Verdict> {
        let closes = snapshot.closes();
        let roc = rate_of_change(&closes, self.config.roc_period)?;
        let rsi_value = rsi(&closes, self.config.rsi_period)?;

        let entry = snapshot.current_price;
        let stop_window = &snapshot.candles[snapshot.candles.len() - self.config.roc_period..];

        let (direction, stop_loss) = if roc >= self.config.min_roc_pct && rsi_value >= 55.0 {
            (Direction::Long, lowest_low(stop_window)?)
        } else if roc <= -self.config.min_roc_pct && rsi_value <= 45.0 {
            (Direction::Short, highest_high(stop_window)?)
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

        let confidence = 55.0 + (roc.abs() * 5.0).min(40.0);

        Some(Verdict {
            category: SignalCategory::MomentumMaster,
            direction,
            entry,
            stop_loss,
            take_profit,
            confidence,
        })
    }
}

#[async_trait]
impl StrategyEvaluator for MomentumMaster {
    fn name(&self) -> &str {
        "Momentum Master"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::MomentumMaster
    }

    async fn evaluate(&self, snapshot: &MarketSnapshot) -> Result<Option<Verdict>> {
        Ok(self.detect(snapshot))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
