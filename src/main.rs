//! SPOTTER — Multi-Strategy Trading Signal Scanner
//!
//! Entry point. Loads configuration, initialises structured logging,
//! rehydrates the signal store from disk (or starts empty), and runs
//! the periodic scan loop with graceful shutdown. The query API and
//! the hourly expiry sweep run as background tasks.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::info;

use spotter::api::{self, routes::QueryContext};
use spotter::config::AppConfig;
use spotter::engine::scanner::{ScannerConfig, SignalScanner};
use spotter::market::binance::BinanceFuturesClient;
use spotter::store::SignalStore;
use spotter::strategy;
use spotter::types::ScanReport;

const BANNER: &str = r#"
  ____  ____   ___ _____ _____ _____ ____
 / ___||  _ \ / _ \_   _|_   _| ____|  _ \
 \___ \| |_) | | | || |   | | |  _| | |_) |
  ___) |  __/| |_| || |   | | | |___|  _ <
 |____/|_|    \___/ |_|   |_| |_____|_| \_\

  Multi-Strategy Trading Signal Scanner
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        symbols = cfg.scanner.symbols.len(),
        scan_interval_secs = cfg.scanner.interval_secs,
        data_file = %cfg.store.data_file,
        "SPOTTER starting up"
    );

    // -- Initialise components -------------------------------------------

    // Store (rehydrates from disk, degrades to empty on absence/corruption)
    let store = Arc::new(SignalStore::open(&cfg.store.data_file));
    info!(signals = store.len(), "Signal store ready");

    // Market data provider
    let provider = Arc::new(BinanceFuturesClient::new(
        &cfg.provider.kline_interval,
        cfg.provider.kline_limit,
    )?);

    // Strategy evaluators (registered once, never at runtime)
    let evaluators = strategy::default_evaluators();
    info!(evaluators = evaluators.len(), "Strategy evaluators registered");

    // Scan orchestrator
    let scanner = Arc::new(SignalScanner::new(
        provider,
        evaluators,
        Arc::clone(&store),
        ScannerConfig {
            symbols: cfg.scanner.symbols.clone(),
            symbol_pause: Duration::from_millis(cfg.scanner.symbol_pause_ms),
        },
    ));

    // Query API
    if cfg.api.enabled {
        let state = Arc::new(QueryContext {
            store: Arc::clone(&store),
            scanner: Arc::clone(&scanner),
        });
        api::spawn_api(state, cfg.api.port)?;
    }

    // Background expiry sweep, independent of reads
    {
        let store = Arc::clone(&store);
        let period = Duration::from_secs(cfg.store.sweep_interval_secs.max(1));
        tokio::spawn(async move {
            let mut sweep_timer = tokio::time::interval(period);
            sweep_timer.tick().await; // skip the immediate tick
            loop {
                sweep_timer.tick().await;
                store.sweep();
            }
        });
    }

    // -- Main loop -------------------------------------------------------

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    // Initial scan shortly after startup, so readers aren't staring at
    // an empty collection for a full interval.
    info!(
        delay_secs = cfg.scanner.startup_delay_secs,
        "Scheduling initial scan"
    );
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(cfg.scanner.startup_delay_secs)) => {
            let report = scanner.scan_cycle().await;
            log_scan_report(&report);
        }
        _ = &mut shutdown => {
            info!("Shutdown signal received.");
            return Ok(());
        }
    }

    // Fixed-period cycles. The cycle body runs inline in this loop, so
    // cycles cannot overlap; a tick missed while scanning fires next
    // rather than bursting.
    let period = Duration::from_secs(cfg.scanner.interval_secs.max(1));
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        interval_secs = cfg.scanner.interval_secs,
        "Entering main loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = scanner.scan_cycle().await;
                log_scan_report(&report);
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!(signals = store.len(), "SPOTTER shut down cleanly.");
    Ok(())
}

/// Log a human-readable cycle summary.
fn log_scan_report(report: &ScanReport) {
    info!(
        scanned = report.symbols_scanned,
        failures = report.snapshot_failures,
        candidates = report.candidates,
        accepted = report.accepted,
        duplicates = report.duplicates,
        "Cycle summary"
    );
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("spotter=info"));

    let json_logging = std::env::var("SPOTTER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
