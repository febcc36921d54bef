//! Engine-level counters for observability.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Monotonic counters maintained by the snapshot engine.
///
/// Counters are updated with relaxed atomics; readers take a [`StatsSnapshot`]
/// and must not expect cross-counter consistency.
#[derive(Debug, Default)]
pub struct EngineStats {
    events_ingested: AtomicU64,
    events_dropped: AtomicU64,
    rollovers: AtomicU64,
    rollover_failures: AtomicU64,
    inflight_carried: AtomicU64,
    sealed_dropped: AtomicU64,
}

impl EngineStats {
    pub(crate) fn record_ingested(&self, n: u64) {
        self.events_ingested.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self, n: u64) {
        self.events_dropped.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn record_rollover(&self) {
        self.rollovers.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rollover_failure(&self) {
        self.rollover_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_inflight_carried(&self, n: u64) {
        self.inflight_carried.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn record_sealed_dropped(&self, n: u64) {
        self.sealed_dropped.fetch_add(n, Ordering::Relaxed);
    }

    /// Copies the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events_ingested: self.events_ingested.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            rollovers: self.rollovers.load(Ordering::Relaxed),
            rollover_failures: self.rollover_failures.load(Ordering::Relaxed),
            inflight_carried: self.inflight_carried.load(Ordering::Relaxed),
            sealed_dropped: self.sealed_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Half-events accepted into a window buffer.
    pub events_ingested: u64,
    /// Half-events rejected by the buffer (row cap) and discarded.
    pub events_dropped: u64,
    /// Window boundary transitions performed.
    pub rollovers: u64,
    /// Rollovers whose inflight carry-over failed and was forfeited.
    pub rollover_failures: u64,
    /// Inflight records copied into a successor window.
    pub inflight_carried: u64,
    /// Sealed buffers destroyed unconsumed after the rotation deadline.
    pub sealed_dropped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let stats = EngineStats::default();
        stats.record_ingested(2);
        stats.record_ingested(3);
        stats.record_dropped(1);
        stats.record_rollover();
        let snap = stats.snapshot();
        assert_eq!(snap.events_ingested, 5);
        assert_eq!(snap.events_dropped, 1);
        assert_eq!(snap.rollovers, 1);
        assert_eq!(snap.rollover_failures, 0);
    }
}
