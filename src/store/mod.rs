//! Signal store — the deduplicating, TTL-aware, persisted collection
//! of signals and the data-model authority.
//!
//! A single exclusive lock guards the in-memory collection and its
//! persisted mirror, so every operation (including the sweep embedded
//! in reads) is an atomic read-modify-persist step to concurrent
//! callers. No method suspends, so the lock is never held across an
//! await point.

use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::policy;
use crate::storage;
use crate::types::{Signal, SignalCategory};

// ---------------------------------------------------------------------------
// Outcomes and views
// ---------------------------------------------------------------------------

/// Result of offering a candidate to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Accepted and durably written.
    Accepted,
    /// Accepted in memory, but the durable write did not confirm.
    /// Callers relying on durability must re-check.
    AcceptedUnpersisted,
    /// Rejected: a live signal for the same `(symbol, category)` was
    /// accepted within the dedup window. A normal outcome, not an error.
    Duplicate,
}

impl AddOutcome {
    /// Whether the candidate entered the store.
    pub fn accepted(&self) -> bool {
        !matches!(self, AddOutcome::Duplicate)
    }
}

/// A live signal annotated with read-time freshness.
#[derive(Debug, Clone, Serialize)]
pub struct ListedSignal {
    #[serde(flatten)]
    pub signal: Signal,
    pub is_new: bool,
}

/// Aggregate view over the live collection.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total: usize,
    /// Signals created within the last hour.
    pub last_hour: usize,
    /// Signals created within the last 24 hours.
    pub last_day: usize,
    pub by_category: HashMap<SignalCategory, usize>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

struct Inner {
    signals: Vec<Signal>,
    path: String,
}

/// TTL-aware, deduplicating signal collection mirrored to a flat file.
pub struct SignalStore {
    inner: Mutex<Inner>,
}

impl SignalStore {
    /// Open a store backed by `path`, rehydrating any persisted
    /// collection. A missing file starts empty; an unreadable or
    /// corrupt file is logged and degrades to empty rather than
    /// failing startup.
    pub fn open(path: &str) -> Self {
        let signals = match storage::load_signals(path) {
            Ok(Some(signals)) => signals,
            Ok(None) => Vec::new(),
            Err(e) => {
                error!(path, error = %e, "Failed to load signals, starting empty");
                Vec::new()
            }
        };

        SignalStore {
            inner: Mutex::new(Inner {
                signals,
                path: path.to_string(),
            }),
        }
    }

    /// Offer a candidate signal. Rejects duplicates within the dedup
    /// window for the candidate's `(symbol, category)` pair; otherwise
    /// appends and persists synchronously.
    pub fn add(&self, candidate: Signal) -> AddOutcome {
        let mut inner = self.lock();
        let cutoff = Utc::now() - policy::dedup_window();

        let duplicate = inner.signals.iter().any(|s| {
            s.symbol == candidate.symbol
                && s.category == candidate.category
                && s.created_at > cutoff
        });
        if duplicate {
            debug!(
                symbol = %candidate.symbol,
                category = %candidate.category,
                "Signal already live for this pair, rejecting duplicate"
            );
            return AddOutcome::Duplicate;
        }

        info!(
            id = %candidate.id,
            symbol = %candidate.symbol,
            category = %candidate.category,
            direction = %candidate.direction,
            "Signal accepted"
        );
        inner.signals.push(candidate);

        match storage::save_signals(&inner.signals, &inner.path) {
            Ok(()) => AddOutcome::Accepted,
            Err(e) => {
                error!(error = %e, "Signal accepted but durable write failed");
                AddOutcome::AcceptedUnpersisted
            }
        }
    }

    /// All live signals, most recent first, annotated with `is_new`.
    /// Sweeps expired entries first, so an expired signal is never
    /// returned.
    pub fn list(&self) -> Vec<ListedSignal> {
        let mut inner = self.lock();
        let now = Utc::now();
        Self::sweep_locked(&mut inner, now);

        let mut signals = inner.signals.clone();
        signals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        signals
            .into_iter()
            .map(|signal| ListedSignal {
                is_new: signal.is_new(now),
                signal,
            })
            .collect()
    }

    /// Remove a signal by id, persisting the change. Returns whether
    /// anything was removed.
    pub fn remove(&self, id: &str) -> bool {
        let mut inner = self.lock();
        let before = inner.signals.len();
        inner.signals.retain(|s| s.id != id);

        if inner.signals.len() == before {
            return false;
        }

        info!(id, "Signal removed");
        if let Err(e) = storage::save_signals(&inner.signals, &inner.path) {
            error!(error = %e, "Signal removed but durable write failed");
        }
        true
    }

    /// Aggregate stats over the live collection (sweeps first).
    pub fn stats(&self) -> StoreStats {
        let mut inner = self.lock();
        let now = Utc::now();
        Self::sweep_locked(&mut inner, now);

        let hour_ago = now - chrono::Duration::hours(1);
        let day_ago = now - chrono::Duration::hours(24);

        let mut by_category: HashMap<SignalCategory, usize> = HashMap::new();
        for signal in &inner.signals {
            *by_category.entry(signal.category).or_insert(0) += 1;
        }

        StoreStats {
            total: inner.signals.len(),
            last_hour: inner.signals.iter().filter(|s| s.created_at > hour_ago).count(),
            last_day: inner.signals.iter().filter(|s| s.created_at > day_ago).count(),
            by_category,
        }
    }

    /// Sweep expired signals out of the collection, persisting only if
    /// anything was removed. Idempotent; safe to run on every read.
    /// Returns the number of signals removed.
    pub fn sweep(&self) -> usize {
        let mut inner = self.lock();
        Self::sweep_locked(&mut inner, Utc::now())
    }

    /// Number of signals currently held (no sweep).
    pub fn len(&self) -> usize {
        self.lock().signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sweep_locked(inner: &mut Inner, now: chrono::DateTime<Utc>) -> usize {
        let before = inner.signals.len();
        inner.signals.retain(|s| !s.is_expired(now));
        let removed = before - inner.signals.len();

        if removed > 0 {
            info!(removed, remaining = inner.signals.len(), "Swept expired signals");
            if let Err(e) = storage::save_signals(&inner.signals, &inner.path) {
                error!(error = %e, "Sweep applied but durable write failed");
            }
        }
        removed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Signal store lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
