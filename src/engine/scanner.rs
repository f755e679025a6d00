//! Scan orchestration.
//!
//! Drives one full pass over the instrument universe: fetch a snapshot
//! per symbol through the pacing gate, fan it out to every registered
//! evaluator concurrently, and offer each positive verdict to the
//! signal store. Failures are contained at the smallest possible
//! scope — a symbol or a single evaluator — and never abort the cycle.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::engine::pacer::Pacer;
use crate::market::MarketDataProvider;
use crate::store::{AddOutcome, SignalStore};
use crate::strategy::StrategyEvaluator;
use crate::types::{MarketSnapshot, ScanReport, Signal, Verdict};

/// Universe and pacing settings for the scanner.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub symbols: Vec<String>,
    /// Minimum spacing between provider calls.
    pub symbol_pause: Duration,
}

/// Periodic full-universe scanner.
///
/// Constructed once at startup with its collaborators injected;
/// whatever drives the schedule calls `scan_cycle` and must not
/// overlap invocations (two concurrent full-universe scans would
/// defeat the pacing).
pub struct SignalScanner {
    provider: Arc<dyn MarketDataProvider>,
    evaluators: Vec<Arc<dyn StrategyEvaluator>>,
    store: Arc<SignalStore>,
    config: ScannerConfig,
    last_scan: RwLock<Option<DateTime<Utc>>>,
}

impl SignalScanner {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        evaluators: Vec<Arc<dyn StrategyEvaluator>>,
        store: Arc<SignalStore>,
        config: ScannerConfig,
    ) -> Self {
        Self {
            provider,
            evaluators,
            store,
            config,
            last_scan: RwLock::new(None),
        }
    }

    /// Start instant of the most recent cycle, if any.
    pub async fn last_scan(&self) -> Option<DateTime<Utc>> {
        *self.last_scan.read().await
    }

    /// Run one full pass over the universe.
    pub async fn scan_cycle(&self) -> ScanReport {
        let started_at = Utc::now();
        *self.last_scan.write().await = Some(started_at);

        info!(
            symbols = self.config.symbols.len(),
            evaluators = self.evaluators.len(),
            "Starting scan cycle"
        );

        let mut report = ScanReport::new(started_at);
        let mut pacer = Pacer::new(self.config.symbol_pause);

        for symbol in &self.config.symbols {
            pacer.wait().await;
            report.symbols_scanned += 1;

            let snapshot = match self.provider.fetch_snapshot(symbol).await {
                Ok(snapshot) if snapshot.candles.is_empty() => {
                    warn!(symbol = %symbol, "Provider returned no data, skipping symbol");
                    report.snapshot_failures += 1;
                    continue;
                }
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Snapshot fetch failed, skipping symbol");
                    report.snapshot_failures += 1;
                    continue;
                }
            };

            for verdict in self.evaluate_all(&snapshot).await {
                report.candidates += 1;
                self.submit(symbol, &verdict, &mut report);
            }
        }

        info!(report = %report, "Scan cycle complete");
        report
    }

    /// Run every evaluator concurrently against one snapshot,
    /// isolating individual failures.
    async fn evaluate_all(&self, snapshot: &MarketSnapshot) -> Vec<Verdict> {
        let evaluations = self.evaluators.iter().map(|evaluator| async move {
            match evaluator.evaluate(snapshot).await {
                Ok(verdict) => verdict,
                Err(e) => {
                    warn!(
                        strategy = evaluator.name(),
                        symbol = %snapshot.symbol,
                        error = %e,
                        "Evaluator failed, isolating"
                    );
                    None
                }
            }
        });

        join_all(evaluations).await.into_iter().flatten().collect()
    }

    /// Assemble a candidate from a verdict and offer it to the store.
    fn submit(&self, symbol: &str, verdict: &Verdict, report: &mut ScanReport) {
        let signal = Signal::from_verdict(symbol, verdict, Utc::now());

        if !signal.geometry_ok() {
            // Accepted anyway: risk/reward is a read-time computation,
            // not a stored invariant.
            warn!(
                id = %signal.id,
                direction = %signal.direction,
                entry = signal.entry,
                stop_loss = signal.stop_loss,
                take_profit = signal.take_profit,
                "Stop/target geometry inconsistent with direction"
            );
        }

        match self.store.add(signal) {
            AddOutcome::Accepted => report.accepted += 1,
            AddOutcome::AcceptedUnpersisted => {
                report.accepted += 1;
                warn!(symbol = %symbol, "Signal held in memory only; durable write failed");
            }
            AddOutcome::Duplicate => {
                report.duplicates += 1;
                debug!(symbol = %symbol, category = %verdict.category, "Duplicate candidate skipped");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SignalStore;
    use crate::types::{Candle, Direction, SignalCategory};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        Provider {}

        #[async_trait]
        impl MarketDataProvider for Provider {
            async fn fetch_snapshot(&self, symbol: &str) -> Result<MarketSnapshot>;
            fn name(&self) -> &str;
        }
    }

    /// Evaluator that fires a fixed verdict for every snapshot.
    struct AlwaysFire(SignalCategory);

    #[async_trait]
    impl StrategyEvaluator for AlwaysFire {
        fn name(&self) -> &str {
            "always-fire"
        }

        fn category(&self) -> SignalCategory {
            self.0
        }

        async fn evaluate(&self, _snapshot: &MarketSnapshot) -> Result<Option<Verdict>> {
            Ok(Some(Verdict {
                category: self.0,
                direction: Direction::Long,
                entry: 100.0,
                stop_loss: 95.0,
                take_profit: 110.0,
                confidence: 70.0,
            }))
        }
    }

    /// Evaluator that always errors.
    struct AlwaysError;

    #[async_trait]
    impl StrategyEvaluator for AlwaysError {
        fn name(&self) -> &str {
            "always-error"
        }

        fn category(&self) -> SignalCategory {
            SignalCategory::Unknown
        }

        async fn evaluate(&self, _snapshot: &MarketSnapshot) -> Result<Option<Verdict>> {
            Err(anyhow!("evaluator blew up"))
        }
    }

    fn sample_snapshot(symbol: &str) -> MarketSnapshot {
        let now = Utc::now();
        let candles = vec![Candle {
            open_time: now - chrono::Duration::minutes(15),
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.0,
            volume: 1000.0,
            close_time: now,
        }];
        MarketSnapshot {
            symbol: symbol.to_string(),
            candles,
            current_price: 100.0,
            as_of: now,
        }
    }

    fn temp_store() -> (Arc<SignalStore>, String) {
        let mut p = std::env::temp_dir();
        p.push(format!("spotter_test_scanner_{}.json", uuid::Uuid::new_v4()));
        let path = p.to_string_lossy().to_string();
        (Arc::new(SignalStore::open(&path)), path)
    }

    fn config(symbols: &[&str]) -> ScannerConfig {
        ScannerConfig {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            symbol_pause: Duration::from_millis(1),
        }
    }

    fn cleanup(path: &str) {
        let _ = crate::storage::delete_signals(path);
    }

    #[tokio::test]
    async fn test_cycle_accepts_signals_for_all_symbols() {
        let mut provider = MockProvider::new();
        provider
            .expect_fetch_snapshot()
            .returning(|symbol| Ok(sample_snapshot(symbol)));

        let (store, path) = temp_store();
        let scanner = SignalScanner::new(
            Arc::new(provider),
            vec![Arc::new(AlwaysFire(SignalCategory::TrendFollowing))],
            Arc::clone(&store),
            config(&["AAAUSDT", "BBBUSDT"]),
        );

        let report = scanner.scan_cycle().await;
        assert_eq!(report.symbols_scanned, 2);
        assert_eq!(report.snapshot_failures, 0);
        assert_eq!(report.candidates, 2);
        assert_eq!(report.accepted, 2);
        assert_eq!(store.len(), 2);
        cleanup(&path);
    }

    #[tokio::test]
    async fn test_provider_failure_isolated_per_symbol() {
        let mut provider = MockProvider::new();
        provider.expect_fetch_snapshot().returning(|symbol| {
            if symbol == "AAAUSDT" {
                Err(anyhow!("network down"))
            } else {
                Ok(sample_snapshot(symbol))
            }
        });

        let (store, path) = temp_store();
        let scanner = SignalScanner::new(
            Arc::new(provider),
            vec![Arc::new(AlwaysFire(SignalCategory::TrendFollowing))],
            Arc::clone(&store),
            config(&["AAAUSDT", "BBBUSDT", "CCCUSDT"]),
        );

        let report = scanner.scan_cycle().await;
        assert_eq!(report.symbols_scanned, 3);
        assert_eq!(report.snapshot_failures, 1);
        assert_eq!(report.accepted, 2);

        let listed = store.list();
        assert!(listed.iter().all(|s| s.signal.symbol != "AAAUSDT"));
        cleanup(&path);
    }

    #[tokio::test]
    async fn test_empty_snapshot_counts_as_failure() {
        let mut provider = MockProvider::new();
        provider.expect_fetch_snapshot().returning(|symbol| {
            Ok(MarketSnapshot {
                symbol: symbol.to_string(),
                candles: Vec::new(),
                current_price: 0.0,
                as_of: Utc::now(),
            })
        });

        let (store, path) = temp_store();
        let scanner = SignalScanner::new(
            Arc::new(provider),
            vec![Arc::new(AlwaysFire(SignalCategory::TrendFollowing))],
            Arc::clone(&store),
            config(&["AAAUSDT"]),
        );

        let report = scanner.scan_cycle().await;
        assert_eq!(report.snapshot_failures, 1);
        assert_eq!(report.accepted, 0);
        assert!(store.is_empty());
        cleanup(&path);
    }

    #[tokio::test]
    async fn test_evaluator_failure_does_not_affect_siblings() {
        let mut provider = MockProvider::new();
        provider
            .expect_fetch_snapshot()
            .returning(|symbol| Ok(sample_snapshot(symbol)));

        let (store, path) = temp_store();
        let scanner = SignalScanner::new(
            Arc::new(provider),
            vec![
                Arc::new(AlwaysError),
                Arc::new(AlwaysFire(SignalCategory::BreakoutTrading)),
            ],
            Arc::clone(&store),
            config(&["AAAUSDT"]),
        );

        let report = scanner.scan_cycle().await;
        assert_eq!(report.candidates, 1);
        assert_eq!(report.accepted, 1);
        assert_eq!(store.list()[0].signal.category, SignalCategory::BreakoutTrading);
        cleanup(&path);
    }

    #[tokio::test]
    async fn test_second_cycle_counts_duplicates() {
        let mut provider = MockProvider::new();
        provider
            .expect_fetch_snapshot()
            .returning(|symbol| Ok(sample_snapshot(symbol)));

        let (store, path) = temp_store();
        let scanner = SignalScanner::new(
            Arc::new(provider),
            vec![Arc::new(AlwaysFire(SignalCategory::TrendFollowing))],
            Arc::clone(&store),
            config(&["AAAUSDT"]),
        );

        let first = scanner.scan_cycle().await;
        assert_eq!(first.accepted, 1);

        let second = scanner.scan_cycle().await;
        assert_eq!(second.accepted, 0);
        assert_eq!(second.duplicates, 1);
        assert_eq!(store.len(), 1);
        cleanup(&path);
    }

    #[tokio::test]
    async fn test_last_scan_recorded() {
        let mut provider = MockProvider::new();
        provider
            .expect_fetch_snapshot()
            .returning(|symbol| Ok(sample_snapshot(symbol)));

        let (store, path) = temp_store();
        let scanner = SignalScanner::new(
            Arc::new(provider),
            Vec::new(),
            store,
            config(&["AAAUSDT"]),
        );

        assert!(scanner.last_scan().await.is_none());
        let report = scanner.scan_cycle().await;
        assert_eq!(scanner.last_scan().await, Some(report.started_at));
        cleanup(&path);
    }
}
