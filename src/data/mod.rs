//! Tick storage module
//!
//! The in-memory stream store shared by ingestion and analytics, plus the
//! optional Parquet tick log.

mod parquet;
mod recorder;
mod store;

pub use parquet::{load_tick_log, tick_schema, LoadedTicks, ParquetReader, ParquetWriter};
pub use recorder::{RecorderConfig, RecorderStats, TickRecorder};
pub use store::{AppendOutcome, StoreStats, StreamStore};

/// Rebuild a stream store from previously captured ticks
pub fn store_from_log(loaded: LoadedTicks) -> StreamStore {
    let store = StreamStore::new();
    for tick in loaded.ticks {
        store.append(tick);
    }
    store
}
