//! Statistics for broadcast and producer activity
//!
//! Counters are plain atomics updated on the hot path; readers take a
//! point-in-time [`snapshot`](RegistryStats::snapshot).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::registry::BroadcastOutcome;

/// Registry-level counters
#[derive(Debug, Default)]
pub struct RegistryStats {
    added: AtomicU64,
    removed: AtomicU64,
    broadcasts: AtomicU64,
    delivered: AtomicU64,
    failed_sends: AtomicU64,
    swept: AtomicU64,
}

/// Point-in-time copy of [`RegistryStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStatsSnapshot {
    /// Connections ever added
    pub added: u64,
    /// Connections removed, by deregistration or sweep
    pub removed: u64,
    /// Broadcast calls completed
    pub broadcasts: u64,
    /// Individual payload deliveries
    pub delivered: u64,
    /// Individual sends that failed or timed out
    pub failed_sends: u64,
    /// Connections removed by a post-broadcast sweep
    pub swept: u64,
}

impl RegistryStats {
    pub(crate) fn on_added(&self) {
        self.added.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn on_removed(&self) {
        self.removed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn on_broadcast(&self, outcome: &BroadcastOutcome) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
        self.delivered
            .fetch_add(outcome.delivered as u64, Ordering::Relaxed);
        self.failed_sends
            .fetch_add(outcome.failed as u64, Ordering::Relaxed);
        self.swept.fetch_add(outcome.swept as u64, Ordering::Relaxed);
    }

    /// Take a snapshot of all counters
    pub fn snapshot(&self) -> RegistryStatsSnapshot {
        RegistryStatsSnapshot {
            added: self.added.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed_sends: self.failed_sends.load(Ordering::Relaxed),
            swept: self.swept.load(Ordering::Relaxed),
        }
    }
}

/// Producer-level counters
#[derive(Debug, Default)]
pub struct ProducerStats {
    cycles: AtomicU64,
    failed_cycles: AtomicU64,
    starts: AtomicU64,
    stops: AtomicU64,
}

/// Point-in-time copy of [`ProducerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerStatsSnapshot {
    /// Cycles that persisted and broadcast a record
    pub cycles: u64,
    /// Cycles that failed and were skipped
    pub failed_cycles: u64,
    /// Idle to running transitions
    pub starts: u64,
    /// Running to idle transitions
    pub stops: u64,
}

impl ProducerStats {
    pub(crate) fn on_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn on_failed_cycle(&self) {
        self.failed_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn on_start(&self) {
        self.starts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn on_stop(&self) {
        self.stops.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of all counters
    pub fn snapshot(&self) -> ProducerStatsSnapshot {
        ProducerStatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            failed_cycles: self.failed_cycles.load(Ordering::Relaxed),
            starts: self.starts.load(Ordering::Relaxed),
            stops: self.stops.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_stats_new() {
        let stats = RegistryStats::default();
        assert_eq!(stats.snapshot(), RegistryStatsSnapshot::default());
    }

    #[test]
    fn test_registry_stats_accumulate_outcomes() {
        let stats = RegistryStats::default();

        stats.on_broadcast(&BroadcastOutcome {
            delivered: 3,
            failed: 1,
            swept: 2,
        });
        stats.on_broadcast(&BroadcastOutcome {
            delivered: 2,
            failed: 0,
            swept: 0,
        });

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.broadcasts, 2);
        assert_eq!(snapshot.delivered, 5);
        assert_eq!(snapshot.failed_sends, 1);
        assert_eq!(snapshot.swept, 2);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let stats = ProducerStats::default();
        stats.on_failed_cycle();

        let json = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(json["failedCycles"], 1);
        assert_eq!(json["cycles"], 0);
    }
}
