//! Trend Following — moving-average alignment.
//!
//! Fires when the fast average sits clearly on one side of the slow
//! average and price trades beyond the fast average. The slow average
//! is the stop. Slower-moving: maps to the default day-long expiry
//! class.

use anyhow::Result;
use async_trait::async_trait;

use super::{sma, StrategyEvaluator};
use crate::types::{Direction, MarketSnapshot, SignalCategory, Verdict};

/// Tunables for the trend detector.
#[derive(Debug, Clone)]
pub struct TrendConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    /// Minimum fast/slow separation, in percent of the slow average.
    pub min_separation_pct: f64,
    pub reward_ratio: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            fast_period: 20,
            slow_period: 50,
            min_separation_pct: 0.5,
            reward_ratio: 1.5,
        }
    }
}

/// Moving-average trend detector.
#[derive(Debug, Default)]
pub struct TrendFollowing {
    config: TrendConfig,
}

impl TrendFollowing {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    fn detect(&self, snapshot: &MarketSnapshot) -> Option<Verdict> {
        let closes = snapshot.closes();
        let fast = sma(&closes, self.config.fast_period)?;
        let slow = sma(&closes, self.config.slow_period)?;
        if slow <= 0.0 {
            return None;
        }

        let entry = snapshot.current_price;
        let separation_pct = (fast - slow).abs() / slow * 100.0;
        if separation_pct < self.config.min_separation_pct {
            return None;
        }

        let direction = if fast > slow && entry > fast {
            Direction::Long
        } else if fast < slow && entry < fast {
            Direction::Short
        } else {
            return None;
        };

        // The slow average is the line in the sand.
        let stop_loss = slow;
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

        let confidence = 55.0 + (separation_pct * 10.0).min(35.0);

        Some(Verdict {
            category: SignalCategory::TrendFollowing,
            direction,
            entry,
            stop_loss,
            take_profit,
            confidence,
        })
    }
}

#[async_trait]
impl StrategyEvaluator for TrendFollowing {
    fn name(&self) -> &str {
        "Trend Following"
    }

    fn category(&self) -> SignalCategory {
        SignalCategory::TrendFollowing
    }

    async fn evaluate(&self, snapshot: &MarketSnapshot) -> Result<Option<Verdict>> {
        Ok(self.detect(snapshot))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Candle;
    use chrono::{Duration, Utc};

    fn snapshot_from_closes(closes: &[f64]) -> MarketSnapshot {
        let now = Utc::now();
        let candles: Vec<Candle> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                open_time: now - Duration::minutes(15 * (closes.len() - i) as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
                close_time: now,
            })
            .collect();
        MarketSnapshot {
            symbol: "TESTUSDT".to_string(),
            current_price: *closes.last().unwrap(),
            candles,
            as_of: now,
        }
    }

    fn uptrend_closes() -> Vec<f64> {
        // 30 flat bars, then a steady climb
        let mut closes = vec![100.0; 30];
        closes.extend((1..=30).map(|i| 100.0 + i as f64));
        closes
    }

    #[tokio::test]
    async fn test_fires_long_in_uptrend() {
        let closes = uptrend_closes();
        let verdict = TrendFollowing::default()
            .evaluate(&snapshot_from_closes(&closes))
            .await
            .unwrap()
            .expect("should fire");

        let slow = sma(&closes, 50).unwrap();
        let entry = *closes.last().unwrap();
        let risk = entry - slow;

        assert_eq!(verdict.category, SignalCategory::TrendFollowing);
        assert_eq!(verdict.direction, Direction::Long);
        assert!((verdict.entry - entry).abs() < 1e-10);
        assert!((verdict.stop_loss - slow).abs() < 1e-10);
        assert!((verdict.take_profit - (entry + 1.5 * risk)).abs() < 1e-9);
        assert!(verdict.confidence > 55.0 && verdict.confidence <= 90.0);
    }

    #[tokio::test]
    async fn test_fires_short_in_downtrend() {
        let mut closes = vec![200.0; 30];
        closes.extend((1..=30).map(|i| 200.0 - i as f64));

        let verdict = TrendFollowing::default()
            .evaluate(&snapshot_from_closes(&closes))
            .await
            .unwrap()
            .expect("should fire");

        assert_eq!(verdict.direction, Direction::Short);
        let slow = sma(&closes, 50).unwrap();
        assert!((verdict.stop_loss - slow).abs() < 1e-10);
        assert!(verdict.take_profit < verdict.entry);
    }

    #[tokio::test]
    async fn test_no_fire_on_flat_series() {
        let closes = vec![100.0; 60];
        assert!(TrendFollowing::default()
            .evaluate(&snapshot_from_closes(&closes))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_no_fire_on_insufficient_history() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        assert!(TrendFollowing::default()
            .evaluate(&snapshot_from_closes(&closes))
            .await
            .unwrap()
            .is_none());
    }
}
