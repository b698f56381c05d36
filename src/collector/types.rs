//! Collector statistics

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion counters, shared by every per-symbol task
#[derive(Debug, Default)]
pub(crate) struct StatCounters {
    pub received: AtomicU64,
    pub appended: AtomicU64,
    pub malformed: AtomicU64,
    pub unsupported: AtomicU64,
    pub out_of_order: AtomicU64,
    pub reconnects: AtomicU64,
}

impl StatCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CollectorStats {
        CollectorStats {
            received: self.received.load(Ordering::Relaxed),
            appended: self.appended.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            unsupported: self.unsupported.load(Ordering::Relaxed),
            out_of_order: self.out_of_order.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time ingestion statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectorStats {
    /// Raw frames received
    pub received: u64,
    /// Ticks stored
    pub appended: u64,
    /// Frames dropped as malformed
    pub malformed: u64,
    /// Non-trade events skipped
    pub unsupported: u64,
    /// Ticks dropped by the out-of-order guard
    pub out_of_order: u64,
    /// Reconnect attempts across all connections
    pub reconnects: u64,
}
