//! Analytics pass
//!
//! Snapshot the store, resample, compute the spread series and signal, then test the
//! spread for stationarity. A pass only reads the store; ingestion keeps appending
//! while it runs.

use super::adf::{AdfConfig, StationarityTester};
use super::spread::{SpreadConfig, SpreadEngine};
use super::{resample, AlignedSample, AnalyticsReport, LatestWindow, Readiness, SignalStatus};
use crate::config::{AnalyticsConfig, ConfigError, FeedConfig};
use crate::data::StreamStore;
use crate::telemetry::{
    increment_counter, record_latency, set_gauge, CounterMetric, GaugeMetric, LatencyMetric,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use std::time::Instant;

/// Pull-based analytics over a shared stream store
#[derive(Debug, Clone)]
pub struct AnalyticsPipeline {
    store: Arc<StreamStore>,
    symbol_a: String,
    symbol_b: String,
    interval: Duration,
    lookback: Option<Duration>,
    engine: SpreadEngine,
    tester: StationarityTester,
}

impl AnalyticsPipeline {
    pub fn new(
        store: Arc<StreamStore>,
        symbol_a: impl Into<String>,
        symbol_b: impl Into<String>,
        interval: Duration,
        engine: SpreadEngine,
        tester: StationarityTester,
    ) -> Self {
        Self {
            store,
            symbol_a: symbol_a.into().to_uppercase(),
            symbol_b: symbol_b.into().to_uppercase(),
            interval,
            lookback: None,
            engine,
            tester,
        }
    }

    /// Build from validated configuration sections
    pub fn from_config(
        store: Arc<StreamStore>,
        feed: &FeedConfig,
        analytics: &AnalyticsConfig,
    ) -> Result<Self, ConfigError> {
        let engine = SpreadEngine::new(SpreadConfig {
            window: analytics.window,
            upper_threshold: analytics.upper_threshold,
            lower_threshold: analytics.lower_threshold,
        })?;
        let tester = StationarityTester::new(AdfConfig {
            lag_policy: analytics.adf_lag,
            min_observations: analytics.adf_min_observations,
            significance: analytics.adf_significance,
        })?;
        if analytics.resample_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "resample_interval_ms must be positive".into(),
            ));
        }

        let mut pipeline = Self::new(
            store,
            &feed.symbol_a,
            &feed.symbol_b,
            Duration::milliseconds(analytics.resample_interval_ms as i64),
            engine,
            tester,
        );
        if let Some(secs) = analytics.lookback_secs {
            pipeline = pipeline.with_lookback(Duration::seconds(secs as i64));
        }
        Ok(pipeline)
    }

    /// Only analyze ticks within `lookback` of the newest stored tick
    pub fn with_lookback(mut self, lookback: Duration) -> Self {
        self.lookback = Some(lookback);
        self
    }

    pub fn symbols(&self) -> (&str, &str) {
        (&self.symbol_a, &self.symbol_b)
    }

    /// Run one pass over the current store contents
    pub fn run_pass(&self) -> AnalyticsReport {
        let started = Instant::now();

        let (ticks_a, ticks_b) = match self.cutoff() {
            Some(since) => (
                self.store.snapshot_since(&self.symbol_a, since),
                self.store.snapshot_since(&self.symbol_b, since),
            ),
            None => (
                self.store.snapshot(&self.symbol_a),
                self.store.snapshot(&self.symbol_b),
            ),
        };

        let aligned: Readiness<_> = resample(&ticks_a, &ticks_b, self.interval).into();

        let spread: Readiness<_> = match &aligned {
            Readiness::Ready(samples) => self.engine.compute(samples).into(),
            Readiness::Waiting(reason) => Readiness::Waiting(reason.clone()),
        };

        let signal = match &spread {
            Readiness::Ready(series) => self.engine.signal(series),
            Readiness::Waiting(reason) => SignalStatus::Unavailable {
                reason: reason.clone(),
            },
        };

        // ADF runs on every aligned spread, independent of the z-score warm-up
        let stationarity: Readiness<_> = match &aligned {
            Readiness::Ready(samples) => {
                let spreads: Vec<f64> = samples.iter().map(AlignedSample::spread).collect();
                self.tester.test(&spreads).into()
            }
            Readiness::Waiting(reason) => Readiness::Waiting(reason.clone()),
        };

        let elapsed = started.elapsed();
        let report = AnalyticsReport {
            generated_at: Utc::now(),
            symbol_a: self.symbol_a.clone(),
            symbol_b: self.symbol_b.clone(),
            aligned,
            spread,
            signal,
            stationarity,
            elapsed_micros: elapsed.as_micros() as u64,
        };

        self.record_metrics(&report);
        record_latency(LatencyMetric::AnalyticsPass, elapsed);
        report
    }

    fn cutoff(&self) -> Option<chrono::DateTime<Utc>> {
        let lookback = self.lookback?;
        let newest = [
            self.store.last_time(&self.symbol_a),
            self.store.last_time(&self.symbol_b),
        ]
        .into_iter()
        .flatten()
        .max()?;
        Some(newest - lookback)
    }

    fn record_metrics(&self, report: &AnalyticsReport) {
        if let Some(samples) = report.aligned.as_ready() {
            set_gauge(GaugeMetric::AlignedSamples, samples.len() as f64);
        }
        if let Some(series) = report.spread.as_ready() {
            if series.latest == LatestWindow::Degenerate {
                increment_counter(CounterMetric::DegenerateWindows, 1);
            }
        }
        if let Some(zscore) = report.signal.zscore() {
            set_gauge(GaugeMetric::LatestZScore, zscore);
        }
        if let Some(result) = report.stationarity.as_ready() {
            set_gauge(GaugeMetric::AdfStatistic, result.statistic);
            set_gauge(GaugeMetric::AdfPValue, result.p_value);
        }
    }
}
