//! Counters and status views.
//!
//! Nothing in the pipeline branches on these; they exist for logs, the CLI
//! summary, and tests.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Resource counts per state, as held by a lease authority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub dirty: usize,
    pub cleaning: usize,
    pub free: usize,
}

/// Live counters shared by the dispatcher and the workers.
#[derive(Debug, Default)]
pub struct JanitorStats {
    cycles: AtomicU64,
    faulted_cycles: AtomicU64,
    acquired: AtomicU64,
    cleaned: AtomicU64,
    cleanup_failures: AtomicU64,
    released_free: AtomicU64,
    released_dirty: AtomicU64,
    release_failures: AtomicU64,
}

impl JanitorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_cycle(&self, faulted: bool) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        if faulted {
            self.faulted_cycles.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_acquired(&self) {
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cleanup(&self, ok: bool) {
        let counter = if ok {
            &self.cleaned
        } else {
            &self.cleanup_failures
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_release(&self, ok: bool, cleaned: bool) {
        let counter = match (ok, cleaned) {
            (false, _) => &self.release_failures,
            (true, true) => &self.released_free,
            (true, false) => &self.released_dirty,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let acquired = self.acquired.load(Ordering::Relaxed);
        let released_free = self.released_free.load(Ordering::Relaxed);
        let released_dirty = self.released_dirty.load(Ordering::Relaxed);
        let release_failures = self.release_failures.load(Ordering::Relaxed);
        StatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            faulted_cycles: self.faulted_cycles.load(Ordering::Relaxed),
            acquired,
            cleaned: self.cleaned.load(Ordering::Relaxed),
            cleanup_failures: self.cleanup_failures.load(Ordering::Relaxed),
            released_free,
            released_dirty,
            release_failures,
            // relaxed loads can race; clamp rather than underflow
            in_flight: acquired.saturating_sub(released_free + released_dirty + release_failures),
        }
    }
}

/// Point-in-time copy of [`JanitorStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub cycles: u64,
    pub faulted_cycles: u64,
    pub acquired: u64,
    pub cleaned: u64,
    pub cleanup_failures: u64,
    pub released_free: u64,
    pub released_dirty: u64,
    pub release_failures: u64,
    /// Acquired but not yet released (queued or being cleaned).
    pub in_flight: u64,
}

impl StatsSnapshot {
    pub fn released(&self) -> u64 {
        self.released_free + self.released_dirty
    }
}
