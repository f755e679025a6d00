//! Signal lifetime policy.
//!
//! The single process-wide table mapping a category to its expiry
//! window, plus the fixed dedup and freshness windows. Both the
//! store's expiry sweep and the query surface's "expires in"
//! computation consume this module, so the numbers exist exactly once.

use chrono::Duration;

use crate::types::SignalCategory;

/// Expiry window for a category. Fast-moving setups go stale within
/// the hour; everything else (including categories this build doesn't
/// recognize) gets the default day-long window.
pub fn expiry(category: SignalCategory) -> Duration {
    match category {
        SignalCategory::MomentumMaster | SignalCategory::BreakoutPro => Duration::hours(1),
        _ => Duration::hours(24),
    }
}

/// Dedup window: at most one accepted signal per `(symbol, category)`
/// within this span, measured from the most recent accepted signal's
/// creation time. Independent of the category's expiry window.
pub fn dedup_window() -> Duration {
    Duration::hours(1)
}

/// How long a signal counts as freshly discovered (`is_new`).
pub fn freshness_window() -> Duration {
    Duration::minutes(5)
}

/// Presentation band for a 0–100 confidence score.
pub fn confidence_band(confidence: f64) -> &'static str {
    if confidence >= 80.0 {
        "high"
    } else if confidence >= 60.0 {
        "medium"
    } else {
        "low"
    }
}
