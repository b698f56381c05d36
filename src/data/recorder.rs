//! Buffered tick recorder for the Parquet tick log

use super::parquet::ParquetWriter;
use crate::feed::Tick;
use chrono::{Duration, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

/// Configuration for tick recording
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Output directory for Parquet segments
    pub output_dir: PathBuf,
    /// Buffer size before flushing
    pub buffer_size: usize,
    /// Maximum time between flushes
    pub flush_interval_secs: u64,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./data"),
            buffer_size: 500,
            flush_interval_secs: 5,
        }
    }
}

/// Recording statistics
#[derive(Debug, Default, Clone)]
pub struct RecorderStats {
    pub ticks_received: u64,
    pub ticks_written: u64,
    pub files_written: u64,
    pub write_errors: u64,
    pub last_flush: Option<chrono::DateTime<Utc>>,
}

/// Records ticks to Parquet segments from a background task
pub struct TickRecorder {
    config: RecorderConfig,
    tick_tx: mpsc::Sender<Tick>,
    writer_task: JoinHandle<()>,
    stats: Arc<RwLock<RecorderStats>>,
}

impl TickRecorder {
    /// Create a new tick recorder; must be called inside a tokio runtime
    pub fn new(config: RecorderConfig) -> Self {
        let (tick_tx, tick_rx) = mpsc::channel(10_000);
        let stats = Arc::new(RwLock::new(RecorderStats::default()));

        let writer = ParquetWriter::new(config.output_dir.clone());
        let writer_stats = stats.clone();
        let writer_config = config.clone();
        let writer_task = tokio::spawn(async move {
            Self::run_writer(tick_rx, writer, writer_config, writer_stats).await;
        });

        Self {
            config,
            tick_tx,
            writer_task,
            stats,
        }
    }

    /// Create a new recorder with default buffering
    pub fn with_output_dir(output_dir: PathBuf) -> Self {
        let config = RecorderConfig {
            output_dir,
            ..Default::default()
        };
        Self::new(config)
    }

    /// Run the writer task
    async fn run_writer(
        mut rx: mpsc::Receiver<Tick>,
        mut writer: ParquetWriter,
        config: RecorderConfig,
        stats: Arc<RwLock<RecorderStats>>,
    ) {
        let mut buffer: Vec<Tick> = Vec::with_capacity(config.buffer_size);
        let mut last_flush = Utc::now();
        let flush_interval = Duration::seconds(config.flush_interval_secs as i64);

        loop {
            // Use timeout to ensure periodic flushing
            let timeout = tokio::time::Duration::from_secs(config.flush_interval_secs);

            tokio::select! {
                result = rx.recv() => {
                    match result {
                        Some(tick) => {
                            stats.write().await.ticks_received += 1;
                            buffer.push(tick);

                            if buffer.len() >= config.buffer_size {
                                Self::flush_buffer(&mut buffer, &mut writer, &stats).await;
                                last_flush = Utc::now();
                            }
                        }
                        None => {
                            // Channel closed, flush remaining and exit
                            Self::flush_buffer(&mut buffer, &mut writer, &stats).await;
                            tracing::info!("Tick recorder shutting down");
                            break;
                        }
                    }
                }

                _ = tokio::time::sleep(timeout) => {
                    let now = Utc::now();
                    if now - last_flush >= flush_interval && !buffer.is_empty() {
                        Self::flush_buffer(&mut buffer, &mut writer, &stats).await;
                        last_flush = now;
                    }
                }
            }
        }
    }

    /// Flush tick buffer to a new segment
    async fn flush_buffer(
        buffer: &mut Vec<Tick>,
        writer: &mut ParquetWriter,
        stats: &Arc<RwLock<RecorderStats>>,
    ) {
        if buffer.is_empty() {
            return;
        }

        let now = Utc::now();
        let path = writer.next_segment_path(now);
        let count = buffer.len();

        match writer.write_ticks(&path, buffer) {
            Ok(()) => {
                let mut s = stats.write().await;
                s.ticks_written += count as u64;
                s.files_written += 1;
                s.last_flush = Some(now);
                tracing::debug!(count, path = ?path, "Flushed ticks");
            }
            Err(e) => {
                stats.write().await.write_errors += 1;
                tracing::error!(error = %e, count, "Failed to write ticks, dropping buffer");
            }
        }

        buffer.clear();
    }

    /// Queue a tick for recording
    pub async fn record(&self, tick: Tick) -> anyhow::Result<()> {
        self.tick_tx
            .send(tick)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send tick: {}", e))?;
        Ok(())
    }

    /// Get output directory
    pub fn output_dir(&self) -> &PathBuf {
        &self.config.output_dir
    }

    /// Get current statistics
    pub async fn stats(&self) -> RecorderStats {
        self.stats.read().await.clone()
    }

    /// Stop accepting ticks, flush the buffer and wait for the writer to finish
    pub async fn close(self) -> RecorderStats {
        let Self {
            tick_tx,
            writer_task,
            stats,
            ..
        } = self;
        drop(tick_tx);
        if let Err(e) = writer_task.await {
            tracing::error!(error = %e, "Tick recorder task failed");
        }
        let final_stats = stats.read().await.clone();
        final_stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::load_tick_log;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn tick(price: rust_decimal::Decimal) -> Tick {
        Tick::new(Utc::now(), "BTCUSDT", price, dec!(0.001))
    }

    #[tokio::test]
    async fn test_recorder_creation() {
        let temp_dir = TempDir::new().unwrap();
        let recorder = TickRecorder::with_output_dir(temp_dir.path().to_path_buf());
        assert_eq!(recorder.output_dir(), temp_dir.path());
    }

    #[tokio::test]
    async fn test_record_tick_flushes_when_buffer_full() {
        let temp_dir = TempDir::new().unwrap();
        let config = RecorderConfig {
            output_dir: temp_dir.path().to_path_buf(),
            buffer_size: 1, // Flush immediately
            flush_interval_secs: 60,
        };

        let recorder = TickRecorder::new(config);
        recorder.record(tick(dec!(42500.00))).await.unwrap();

        // Give time for async flush
        tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

        let stats = recorder.stats().await;
        assert_eq!(stats.ticks_received, 1);
        assert_eq!(stats.ticks_written, 1);
    }

    #[tokio::test]
    async fn test_close_flushes_partial_buffer() {
        let temp_dir = TempDir::new().unwrap();
        let config = RecorderConfig {
            output_dir: temp_dir.path().to_path_buf(),
            buffer_size: 100,
            flush_interval_secs: 60,
        };

        let recorder = TickRecorder::new(config);
        recorder.record(tick(dec!(100))).await.unwrap();
        recorder.record(tick(dec!(101))).await.unwrap();

        let stats = recorder.close().await;
        assert_eq!(stats.ticks_written, 2);
        assert_eq!(stats.files_written, 1);

        let loaded = load_tick_log(temp_dir.path()).unwrap();
        assert_eq!(loaded.ticks.len(), 2);
    }

    #[test]
    fn test_default_config() {
        let config = RecorderConfig::default();
        assert_eq!(config.buffer_size, 500);
        assert_eq!(config.flush_interval_secs, 5);
    }
}
