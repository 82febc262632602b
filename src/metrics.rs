//! Lightweight counters for the stream-processing core (A4). Mirrors the
//! teacher's own atomic-counter style (`edge::receiver::EdgeReceiverStats`)
//! rather than routing through an unused metrics-exporter crate: the
//! counters are cheap `AtomicU64`s a process can snapshot and log or expose
//! on its own schedule.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct ProcessorStats {
    pub messages_processed: AtomicU64,
    pub messages_failed: AtomicU64,
    pub messages_reclaimed: AtomicU64,
    pub reclaim_attempts: AtomicU64,
    pub empty_batches: AtomicU64,
}

impl ProcessorStats {
    pub fn record_processed(&self) {
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.messages_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reclaimed(&self, count: u64) {
        self.reclaim_attempts.fetch_add(1, Ordering::Relaxed);
        self.messages_reclaimed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_empty_batch(&self) {
        self.empty_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProcessorStatsSnapshot {
        ProcessorStatsSnapshot {
            messages_processed: self.messages_processed.load(Ordering::Relaxed),
            messages_failed: self.messages_failed.load(Ordering::Relaxed),
            messages_reclaimed: self.messages_reclaimed.load(Ordering::Relaxed),
            reclaim_attempts: self.reclaim_attempts.load(Ordering::Relaxed),
            empty_batches: self.empty_batches.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ProcessorStatsSnapshot {
    pub messages_processed: u64,
    pub messages_failed: u64,
    pub messages_reclaimed: u64,
    pub reclaim_attempts: u64,
    pub empty_batches: u64,
}
