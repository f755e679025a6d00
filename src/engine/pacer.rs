//! Fixed-interval pacing gate.
//!
//! The sequential walk over the instrument universe is a deliberate
//! backpressure mechanism protecting the external data provider. The
//! gate makes that pacing contract explicit and testable against
//! tokio's virtual clock instead of burying it in ad hoc sleeps.

use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Gate that lets one call through per period.
///
/// The first `wait` returns immediately; each subsequent `wait`
/// completes no earlier than one period after the previous one.
pub struct Pacer {
    interval: Interval,
}

impl Pacer {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    /// Wait for the next slot.
    pub async fn wait(&mut self) {
        self.interval.tick().await;
    }
}
