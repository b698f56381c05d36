//! Analyze command implementation

use crate::analytics::AnalyticsPipeline;
use crate::config::Config;
use crate::data::{load_tick_log, store_from_log};
use crate::report::{JsonRenderer, Renderer, TableRenderer};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Directory with captured tick segments (defaults to data.output_dir)
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        config.validate()?;

        let data_dir = self
            .data_dir
            .clone()
            .unwrap_or_else(|| config.data.output_dir.clone());
        tracing::info!("Analyzing ticks in {:?}...", data_dir);

        let report = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let loaded = load_tick_log(&data_dir)?;
            if loaded.skipped_rows > 0 || loaded.skipped_files > 0 {
                tracing::warn!(
                    skipped_rows = loaded.skipped_rows,
                    skipped_files = loaded.skipped_files,
                    "Skipped unreadable tick data"
                );
            }
            tracing::info!(ticks = loaded.ticks.len(), "Loaded tick log");

            let store = Arc::new(store_from_log(loaded));
            let pipeline =
                AnalyticsPipeline::from_config(store, &config.feed, &config.analytics)?;
            Ok(pipeline.run_pass())
        })
        .await??;

        let renderer: Box<dyn Renderer> = if self.json {
            Box::new(JsonRenderer::stdout())
        } else {
            Box::new(TableRenderer)
        };
        renderer.render(&report)
    }
}
