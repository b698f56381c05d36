//! CLI interface for pairwatch
//!
//! Provides subcommands for:
//! - `run`: Collect both symbols and run analytics on a fixed cadence
//! - `collect`: Ingestion and tick capture only
//! - `analyze`: One analytics pass over a captured tick log
//! - `config`: Show the effective configuration

mod analyze;
mod collect;
mod run;

pub use analyze::AnalyzeArgs;
pub use collect::CollectArgs;
pub use run::RunArgs;

use crate::collector::{Collector, CollectorHandle};
use crate::config::Config;
use crate::data::{RecorderConfig, StreamStore, TickRecorder};
use crate::feed::BinanceFeed;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "pairwatch")]
#[command(about = "Pairs spread analytics: rolling z-score signal and ADF stationarity")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect ticks and run periodic analytics
    Run(RunArgs),
    /// Ingestion and capture only (no analytics)
    Collect(CollectArgs),
    /// One analytics pass over captured ticks
    Analyze(AnalyzeArgs),
    /// Show configuration
    Config,
}

/// Start the Binance collector for the configured pair
///
/// `capture_dir` enables the Parquet tick recorder.
pub(crate) async fn start_collector(
    config: &Config,
    store: Arc<StreamStore>,
    capture_dir: Option<PathBuf>,
) -> anyhow::Result<CollectorHandle> {
    let feed = Arc::new(BinanceFeed::new(
        config.collector.ws_config(&config.feed.ws_url),
    ));

    let mut collector = Collector::new(feed, store);
    if let Some(output_dir) = capture_dir {
        tracing::info!(output_dir = ?output_dir, "Tick capture enabled");
        collector = collector.with_recorder(TickRecorder::new(RecorderConfig {
            output_dir,
            buffer_size: config.data.buffer_size,
            flush_interval_secs: config.data.flush_interval_secs,
        }));
    }

    let symbols = [config.feed.symbol_a.clone(), config.feed.symbol_b.clone()];
    collector.start(&symbols).await
}
