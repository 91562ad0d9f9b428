//! Metrics registry for rankkeeper
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for the ordering core.
///
/// Relaxed atomics; values are exact once all writers are done.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    inserts: AtomicU64,
    deletes: AtomicU64,
    /// Rows shifted down by delete renumbering
    rows_renumbered: AtomicU64,
    moves_up: AtomicU64,
    moves_down: AtomicU64,
    moves_noop: AtomicU64,
    lock_conflicts: AtomicU64,
    rollbacks: AtomicU64,
    repairs: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_inserts(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deletes(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_rows_renumbered(&self, rows: u64) {
        self.rows_renumbered.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn increment_moves_up(&self) {
        self.moves_up.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_moves_down(&self) {
        self.moves_down.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_moves_noop(&self) {
        self.moves_noop.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_lock_conflicts(&self) {
        self.lock_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rollbacks(&self) {
        self.rollbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_repairs(&self) {
        self.repairs.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            inserts: self.inserts.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            rows_renumbered: self.rows_renumbered.load(Ordering::Relaxed),
            moves_up: self.moves_up.load(Ordering::Relaxed),
            moves_down: self.moves_down.load(Ordering::Relaxed),
            moves_noop: self.moves_noop.load(Ordering::Relaxed),
            lock_conflicts: self.lock_conflicts.load(Ordering::Relaxed),
            rollbacks: self.rollbacks.load(Ordering::Relaxed),
            repairs: self.repairs.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub inserts: u64,
    pub deletes: u64,
    pub rows_renumbered: u64,
    pub moves_up: u64,
    pub moves_down: u64,
    pub moves_noop: u64,
    pub lock_conflicts: u64,
    pub rollbacks: u64,
    pub repairs: u64,
}
