//! Parquet tick log
//!
//! Each flush writes one immutable segment file; the log is the set of segments in
//! the output directory, read back in file-name order.

use crate::feed::Tick;
use arrow::array::{Array, ArrayRef, StringArray, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use rust_decimal::Decimal;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// File name prefix of tick log segments
pub const SEGMENT_PREFIX: &str = "ticks";

/// Tick log schema: time, symbol, price, qty
pub fn tick_schema() -> Schema {
    Schema::new(vec![
        Field::new(
            "time",
            DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
            false,
        ),
        Field::new("symbol", DataType::Utf8, false),
        Field::new("price", DataType::Utf8, false), // Store as string for Decimal precision
        Field::new("qty", DataType::Utf8, false),
    ])
}

/// Writes tick log segments
pub struct ParquetWriter {
    output_dir: PathBuf,
    sequence: u64,
}

impl ParquetWriter {
    /// Create a new Parquet writer
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            sequence: 0,
        }
    }

    /// Ensure output directory exists
    pub fn ensure_dir(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// Path of the next segment; the sequence keeps same-millisecond flushes apart
    pub fn next_segment_path(&mut self, now: DateTime<Utc>) -> PathBuf {
        self.sequence += 1;
        let filename = format!(
            "{}_{}_{:06}.parquet",
            SEGMENT_PREFIX,
            now.format("%Y%m%d_%H%M%S_%3f"),
            self.sequence
        );
        self.output_dir.join(filename)
    }

    /// Write ticks to a new segment file
    pub fn write_ticks(&self, path: &Path, ticks: &[Tick]) -> anyhow::Result<()> {
        if ticks.is_empty() {
            return Ok(());
        }

        self.ensure_dir()?;

        let schema = Arc::new(tick_schema());
        let file = File::create(path)?;

        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        let times: Vec<i64> = ticks.iter().map(|t| t.time.timestamp_millis()).collect();
        let symbols: Vec<&str> = ticks.iter().map(|t| t.symbol.as_str()).collect();
        let prices: Vec<String> = ticks.iter().map(|t| t.price.to_string()).collect();
        let quantities: Vec<String> = ticks.iter().map(|t| t.quantity.to_string()).collect();

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(TimestampMillisecondArray::from(times).with_timezone("UTC")) as ArrayRef,
                Arc::new(StringArray::from(symbols)) as ArrayRef,
                Arc::new(StringArray::from(
                    prices.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
                )) as ArrayRef,
                Arc::new(StringArray::from(
                    quantities.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
                )) as ArrayRef,
            ],
        )?;

        writer.write(&batch)?;
        writer.close()?;

        tracing::debug!(path = ?path, count = ticks.len(), "Wrote ticks to Parquet");

        Ok(())
    }
}

/// Ticks read back from the log, with the rows that had to be skipped
#[derive(Debug, Default)]
pub struct LoadedTicks {
    pub ticks: Vec<Tick>,
    pub skipped_rows: usize,
    pub skipped_files: usize,
}

/// Reader for a single segment file
pub struct ParquetReader {
    path: PathBuf,
}

impl ParquetReader {
    /// Create a new reader for a Parquet file
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read ticks; rows that do not parse are counted and skipped
    pub fn read_ticks(&self) -> anyhow::Result<(Vec<Tick>, usize)> {
        let file = File::open(&self.path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let reader = builder.build()?;

        let mut ticks = Vec::new();
        let mut skipped = 0;

        for batch_result in reader {
            let batch = batch_result?;

            let times = column::<TimestampMillisecondArray>(&batch, "time")?;
            let symbols = column::<StringArray>(&batch, "symbol")?;
            let prices = column::<StringArray>(&batch, "price")?;
            let quantities = column::<StringArray>(&batch, "qty")?;

            for i in 0..batch.num_rows() {
                match parse_row(times, symbols, prices, quantities, i) {
                    Some(tick) => ticks.push(tick),
                    None => skipped += 1,
                }
            }
        }

        Ok((ticks, skipped))
    }
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> anyhow::Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| anyhow::anyhow!("Invalid {} column", name))
}

fn parse_row(
    times: &TimestampMillisecondArray,
    symbols: &StringArray,
    prices: &StringArray,
    quantities: &StringArray,
    i: usize,
) -> Option<Tick> {
    if times.is_null(i) || symbols.is_null(i) || prices.is_null(i) || quantities.is_null(i) {
        return None;
    }
    let time = DateTime::from_timestamp_millis(times.value(i))?;
    let symbol = symbols.value(i).trim();
    let price = Decimal::from_str(prices.value(i).trim()).ok()?;
    let quantity = Decimal::from_str(quantities.value(i).trim()).ok()?;
    if symbol.is_empty() || price <= Decimal::ZERO || quantity <= Decimal::ZERO {
        return None;
    }
    Some(Tick::new(time, symbol, price, quantity))
}

/// Load every segment in `dir`, ordered by time (stable, so arrival order breaks ties)
///
/// A missing directory or an empty one means "no data yet" and is not an error;
/// unreadable files are skipped with a warning.
pub fn load_tick_log(dir: &Path) -> anyhow::Result<LoadedTicks> {
    let mut loaded = LoadedTicks::default();

    if !dir.exists() {
        tracing::info!(dir = ?dir, "Tick log directory does not exist yet");
        return Ok(loaded);
    }

    let mut segments: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "parquet")
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(SEGMENT_PREFIX))
        })
        .collect();
    segments.sort();

    for path in segments {
        match ParquetReader::new(path.clone()).read_ticks() {
            Ok((ticks, skipped)) => {
                loaded.ticks.extend(ticks);
                loaded.skipped_rows += skipped;
            }
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Skipping unreadable tick log segment");
                loaded.skipped_files += 1;
            }
        }
    }

    loaded.ticks.sort_by_key(|t| t.time);

    Ok(loaded)
}
