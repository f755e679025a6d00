//! Query surface route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<QueryContext>`.
//! The presentation-oriented derived fields (time-ago, expires-in,
//! confidence band) are computed here from the same `policy` table the
//! store's sweep uses, so the two can't drift apart.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::engine::scanner::SignalScanner;
use crate::policy;
use crate::store::{ListedSignal, SignalStore};
use crate::types::Signal;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct QueryContext {
    pub store: Arc<SignalStore>,
    pub scanner: Arc<SignalScanner>,
}

pub type ApiState = Arc<QueryContext>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A live signal enriched with read-time presentation fields.
#[derive(Debug, Clone, Serialize)]
pub struct SignalView {
    #[serde(flatten)]
    pub signal: Signal,
    pub is_new: bool,
    pub age_secs: i64,
    pub expires_in_secs: i64,
    pub time_ago: String,
    pub expires_in: String,
    pub confidence_band: &'static str,
    /// Reward-to-risk ratio; absent when entry/stop geometry is degenerate.
    pub risk_reward: Option<f64>,
}

impl SignalView {
    fn build(listed: ListedSignal, now: DateTime<Utc>) -> Self {
        let age = listed.signal.age(now);
        let remaining = policy::expiry(listed.signal.category) - age;

        SignalView {
            is_new: listed.is_new,
            age_secs: age.num_seconds(),
            expires_in_secs: remaining.num_seconds().max(0),
            time_ago: time_ago_label(age),
            expires_in: expires_in_label(remaining),
            confidence_band: policy::confidence_band(listed.signal.confidence),
            risk_reward: listed.signal.risk_reward(),
            signal: listed.signal,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalsResponse {
    pub success: bool,
    pub signals: Vec<SignalView>,
    pub total: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub total: usize,
    pub last_hour: usize,
    pub last_day: usize,
    pub by_category: BTreeMap<String, usize>,
    pub last_scan: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

/// "Just now" / "Nm ago" / "Nh ago" / "Nd ago".
fn time_ago_label(age: Duration) -> String {
    let mins = age.num_minutes();
    let hours = age.num_hours();

    if mins < 1 {
        "Just now".to_string()
    } else if mins < 60 {
        format!("{mins}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else {
        format!("{}d ago", hours / 24)
    }
}

/// "Expired" / "Nh Nm" / "Nm".
fn expires_in_label(remaining: Duration) -> String {
    if remaining <= Duration::zero() {
        return "Expired".to_string();
    }

    let hours = remaining.num_hours();
    let mins = remaining.num_minutes() % 60;

    if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/signals
pub async fn get_signals(State(state): State<ApiState>) -> Json<SignalsResponse> {
    let now = Utc::now();
    let signals: Vec<SignalView> = state
        .store
        .list()
        .into_iter()
        .map(|listed| SignalView::build(listed, now))
        .collect();

    Json(SignalsResponse {
        success: true,
        total: signals.len(),
        signals,
        timestamp: now,
    })
}

/// GET /api/stats
pub async fn get_stats(State(state): State<ApiState>) -> Json<StatsResponse> {
    let stats = state.store.stats();
    let by_category = stats
        .by_category
        .into_iter()
        .map(|(category, count)| (category.to_string(), count))
        .collect();

    Json(StatsResponse {
        success: true,
        total: stats.total,
        last_hour: stats.last_hour,
        last_day: stats.last_day,
        by_category,
        last_scan: state.scanner.last_scan().await,
    })
}

/// DELETE /api/signals/:id
pub async fn delete_signal(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Json<DeleteResponse> {
    let removed = state.store.remove(&id);
    Json(DeleteResponse {
        success: removed,
        message: if removed { "Signal deleted" } else { "Signal not found" },
    })
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scanner::{ScannerConfig, SignalScanner};
    use crate::market::MarketDataProvider;
    use crate::types::{make_signal_id, Direction, MarketSnapshot, SignalCategory};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    /// Provider stub; the route tests never drive a scan.
    struct NullProvider;

    #[async_trait]
    impl MarketDataProvider for NullProvider {
        async fn fetch_snapshot(&self, symbol: &str) -> anyhow::Result<MarketSnapshot> {
            Err(anyhow!("no data for {symbol}"))
        }

        fn name(&self) -> &str {
            "null"
        }
    }

    fn temp_path() -> String {
        let mut p = std::env::temp_dir();
        p.push(format!("spotter_test_api_{}.json", uuid::Uuid::new_v4()));
        p.to_string_lossy().to_string()
    }

    fn make_signal(symbol: &str, category: SignalCategory, created_at: DateTime<Utc>) -> Signal {
        Signal {
            id: make_signal_id(symbol, category, created_at),
            symbol: symbol.to_string(),
            category,
            direction: Direction::Long,
            entry: 100.0,
            stop_loss: 95.0,
            take_profit: 110.0,
            confidence: 85.0,
            created_at,
        }
    }

    fn test_state(path: &str) -> ApiState {
        let store = Arc::new(SignalStore::open(path));
        let scanner = Arc::new(SignalScanner::new(
            Arc::new(NullProvider),
            Vec::new(),
            Arc::clone(&store),
            ScannerConfig {
                symbols: Vec::new(),
                symbol_pause: std::time::Duration::from_millis(1),
            },
        ));
        Arc::new(QueryContext { store, scanner })
    }

    fn cleanup(path: &str) {
        let _ = crate::storage::delete_signals(path);
    }

    // -- Label helpers ---------------------------------------------------

    #[test]
    fn test_time_ago_labels() {
        assert_eq!(time_ago_label(Duration::seconds(30)), "Just now");
        assert_eq!(time_ago_label(Duration::minutes(5)), "5m ago");
        assert_eq!(time_ago_label(Duration::minutes(59)), "59m ago");
        assert_eq!(time_ago_label(Duration::hours(3)), "3h ago");
        assert_eq!(time_ago_label(Duration::hours(50)), "2d ago");
    }

    #[test]
    fn test_expires_in_labels() {
        assert_eq!(expires_in_label(Duration::minutes(-1)), "Expired");
        assert_eq!(expires_in_label(Duration::zero()), "Expired");
        assert_eq!(expires_in_label(Duration::minutes(45)), "45m");
        assert_eq!(expires_in_label(Duration::minutes(150)), "2h 30m");
    }

    // -- View building ---------------------------------------------------

    #[test]
    fn test_signal_view_derived_fields() {
        let now = Utc::now();
        let signal = make_signal("BTCUSDT", SignalCategory::TrendFollowing, now - Duration::minutes(30));
        let view = SignalView::build(
            ListedSignal {
                is_new: false,
                signal,
            },
            now,
        );

        assert_eq!(view.age_secs, 30 * 60);
        // 24h window minus 30 minutes
        assert_eq!(view.expires_in_secs, (24 * 60 - 30) * 60);
        assert_eq!(view.time_ago, "30m ago");
        assert_eq!(view.expires_in, "23h 30m");
        assert_eq!(view.confidence_band, "high");
        assert!((view.risk_reward.unwrap() - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_signal_view_short_category_window() {
        let now = Utc::now();
        let signal = make_signal("BTCUSDT", SignalCategory::MomentumMaster, now - Duration::minutes(20));
        let view = SignalView::build(ListedSignal { is_new: false, signal }, now);
        assert_eq!(view.expires_in, "40m");
    }

    // -- Handlers through the router --------------------------------------

    #[tokio::test]
    async fn test_health_endpoint() {
        let path = temp_path();
        let app = crate::api::build_router(test_state(&path));
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        cleanup(&path);
    }

    #[tokio::test]
    async fn test_signals_endpoint_lists_live_signals() {
        let path = temp_path();
        let state = test_state(&path);
        state
            .store
            .add(make_signal("BTCUSDT", SignalCategory::TrendFollowing, Utc::now()));

        let app = crate::api::build_router(Arc::clone(&state));
        let resp = app
            .oneshot(Request::builder().uri("/api/signals").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["total"], 1);
        assert_eq!(json["signals"][0]["symbol"], "BTCUSDT");
        assert_eq!(json["signals"][0]["category"], "Trend Following");
        assert_eq!(json["signals"][0]["is_new"], true);
        assert_eq!(json["signals"][0]["confidence_band"], "high");
        cleanup(&path);
    }

    #[tokio::test]
    async fn test_signals_endpoint_hides_expired() {
        let path = temp_path();
        let state = test_state(&path);
        state.store.add(make_signal(
            "BTCUSDT",
            SignalCategory::MomentumMaster,
            Utc::now() - Duration::minutes(61),
        ));

        let app = crate::api::build_router(Arc::clone(&state));
        let resp = app
            .oneshot(Request::builder().uri("/api/signals").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["total"], 0);
        cleanup(&path);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let path = temp_path();
        let state = test_state(&path);
        state
            .store
            .add(make_signal("BTCUSDT", SignalCategory::TrendFollowing, Utc::now()));
        state
            .store
            .add(make_signal("ETHUSDT", SignalCategory::BreakoutPro, Utc::now()));

        let app = crate::api::build_router(Arc::clone(&state));
        let resp = app
            .oneshot(Request::builder().uri("/api/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["total"], 2);
        assert_eq!(json["last_hour"], 2);
        assert_eq!(json["by_category"]["Trend Following"], 1);
        assert_eq!(json["by_category"]["Breakout Pro"], 1);
        assert!(json["last_scan"].is_null());
        cleanup(&path);
    }

    #[tokio::test]
    async fn test_delete_endpoint() {
        let path = temp_path();
        let state = test_state(&path);
        let signal = make_signal("BTCUSDT", SignalCategory::TrendFollowing, Utc::now());
        let id = signal.id.clone();
        state.store.add(signal);

        let app = crate::api::build_router(Arc::clone(&state));
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/signals/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], true);
        assert!(state.store.is_empty());

        // Second delete of the same id reports not found.
        let resp = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/signals/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        cleanup(&path);
    }
}
