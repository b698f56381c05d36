//! In-memory stream store
//!
//! Append-only per-instrument tick log. One writer per instrument, any number of
//! readers. Readers copy a consistent prefix under a short read lock, so an analytics
//! pass never holds the lock while it computes.

use crate::feed::Tick;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Result of an append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Stored at the end of the instrument's log
    Appended,
    /// Earlier than the last stored tick for the instrument; discarded
    DroppedOutOfOrder,
}

/// Store counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub appended: u64,
    pub dropped_out_of_order: u64,
}

/// Append-only tick log keyed by instrument symbol
#[derive(Debug, Default)]
pub struct StreamStore {
    logs: RwLock<HashMap<String, Vec<Tick>>>,
    appended: AtomicU64,
    dropped_out_of_order: AtomicU64,
}

impl StreamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tick; out-of-order ticks are counted and dropped, never raised
    pub fn append(&self, tick: Tick) -> AppendOutcome {
        let mut logs = self.logs.write();
        let log = logs.entry(tick.symbol.clone()).or_default();

        if let Some(last) = log.last() {
            if tick.time < last.time {
                self.dropped_out_of_order.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    symbol = %tick.symbol,
                    time = %tick.time,
                    "Dropping out-of-order tick"
                );
                return AppendOutcome::DroppedOutOfOrder;
            }
        }

        log.push(tick);
        self.appended.fetch_add(1, Ordering::Relaxed);
        AppendOutcome::Appended
    }

    /// Full ordered history for an instrument (empty if unknown)
    pub fn snapshot(&self, symbol: &str) -> Vec<Tick> {
        self.logs.read().get(symbol).cloned().unwrap_or_default()
    }

    /// Ordered history with `time >= since`
    pub fn snapshot_since(&self, symbol: &str, since: DateTime<Utc>) -> Vec<Tick> {
        let logs = self.logs.read();
        match logs.get(symbol) {
            Some(log) => {
                let start = log.partition_point(|t| t.time < since);
                log[start..].to_vec()
            }
            None => Vec::new(),
        }
    }

    /// Number of stored ticks for an instrument
    pub fn len(&self, symbol: &str) -> usize {
        self.logs.read().get(symbol).map_or(0, Vec::len)
    }

    /// True when no instrument has any tick
    pub fn is_empty(&self) -> bool {
        self.logs.read().values().all(Vec::is_empty)
    }

    /// Time of the most recent tick for an instrument
    pub fn last_time(&self, symbol: &str) -> Option<DateTime<Utc>> {
        self.logs
            .read()
            .get(symbol)
            .and_then(|log| log.last())
            .map(|t| t.time)
    }

    /// Known instrument symbols, sorted
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.logs.read().keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            appended: self.appended.load(Ordering::Relaxed),
            dropped_out_of_order: self.dropped_out_of_order.load(Ordering::Relaxed),
        }
    }
}
