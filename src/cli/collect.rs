//! Collect command implementation

use super::start_collector;
use crate::config::Config;
use crate::data::StreamStore;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Interval between progress log lines
const STATS_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Output directory for captured ticks (defaults to data.output_dir)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CollectArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        config.validate()?;

        let output = self
            .output
            .clone()
            .unwrap_or_else(|| config.data.output_dir.clone());
        tracing::info!("Starting tick capture to {:?}...", output);

        let store = Arc::new(StreamStore::new());
        let collector = start_collector(&config, store, Some(output)).await?;

        let mut stats_timer = tokio::time::interval(STATS_INTERVAL);
        stats_timer.tick().await;

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => break,
                _ = stats_timer.tick() => {
                    let stats = collector.stats();
                    let states = collector.connection_states();
                    tracing::info!(?stats, ?states, "Capture progress");
                }
            }
        }

        tracing::info!("Shutting down capture");
        let (stats, recorder) = collector.shutdown().await;
        if let Some(recorder) = recorder {
            tracing::info!(
                ticks_written = recorder.ticks_written,
                files_written = recorder.files_written,
                write_errors = recorder.write_errors,
                "Capture flushed"
            );
        }
        tracing::info!(?stats, "Stopped");

        Ok(())
    }
}
