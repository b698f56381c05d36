//! Run command implementation

use super::start_collector;
use crate::analytics::AnalyticsPipeline;
use crate::config::Config;
use crate::data::StreamStore;
use crate::report::{JsonRenderer, LogRenderer, Renderer};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override instrument A
    #[arg(long)]
    pub symbol_a: Option<String>,

    /// Override instrument B
    #[arg(long)]
    pub symbol_b: Option<String>,

    /// Override the rolling window size
    #[arg(short, long)]
    pub window: Option<usize>,

    /// Emit each report as a JSON line on stdout
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Apply command-line overrides on top of the file configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(symbol) = &self.symbol_a {
            config.feed.symbol_a = symbol.to_uppercase();
        }
        if let Some(symbol) = &self.symbol_b {
            config.feed.symbol_b = symbol.to_uppercase();
        }
        if let Some(window) = self.window {
            config.analytics.window = window;
        }
    }

    pub async fn execute(&self, mut config: Config) -> anyhow::Result<()> {
        self.apply(&mut config);
        config.validate()?;

        let store = Arc::new(StreamStore::new());
        let pipeline = Arc::new(AnalyticsPipeline::from_config(
            store.clone(),
            &config.feed,
            &config.analytics,
        )?);
        let renderer: Box<dyn Renderer> = if self.json {
            Box::new(JsonRenderer::stdout())
        } else {
            Box::new(LogRenderer)
        };

        let capture = config
            .data
            .capture_enabled
            .then(|| config.data.output_dir.clone());
        let collector = start_collector(&config, store, capture).await?;

        tracing::info!(
            symbol_a = %config.feed.symbol_a,
            symbol_b = %config.feed.symbol_b,
            window = config.analytics.window,
            refresh_secs = config.analytics.refresh_secs,
            "Pair analytics running, Ctrl-C to stop"
        );

        let mut ticker = tokio::time::interval(Duration::from_secs(config.analytics.refresh_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => break,
                _ = ticker.tick() => {}
            }

            let pass = {
                let pipeline = pipeline.clone();
                tokio::task::spawn_blocking(move || pipeline.run_pass())
            };

            // A pass still running at shutdown is abandoned
            tokio::select! {
                _ = &mut ctrl_c => break,
                result = pass => match result {
                    Ok(report) => {
                        if let Err(e) = renderer.render(&report) {
                            tracing::warn!(error = %e, "Failed to render report");
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "Analytics pass panicked"),
                },
            }
        }

        tracing::info!("Shutting down");
        let (stats, recorder) = collector.shutdown().await;
        tracing::info!(?stats, ?recorder, "Stopped");

        Ok(())
    }
}
