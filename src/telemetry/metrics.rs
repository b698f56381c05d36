//! Prometheus metrics

use std::time::Duration;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Ticks accepted into the stream store
    TicksAppended,
    /// Ticks dropped for arriving earlier than the last stored tick
    OutOfOrderDropped,
    /// Events dropped by the normalizer
    MalformedEvents,
    /// Non-trade events skipped
    UnsupportedEvents,
    /// WebSocket reconnect attempts
    Reconnects,
    /// Rolling windows with zero variance
    DegenerateWindows,
}

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// One full analytics pass
    AnalyticsPass,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Most recent valid z-score
    LatestZScore,
    /// ADF test statistic
    AdfStatistic,
    /// ADF p-value
    AdfPValue,
    /// Aligned samples in the last pass
    AlignedSamples,
}

impl CounterMetric {
    pub fn name(self) -> &'static str {
        match self {
            CounterMetric::TicksAppended => "pairwatch_ticks_appended_total",
            CounterMetric::OutOfOrderDropped => "pairwatch_out_of_order_dropped_total",
            CounterMetric::MalformedEvents => "pairwatch_malformed_events_total",
            CounterMetric::UnsupportedEvents => "pairwatch_unsupported_events_total",
            CounterMetric::Reconnects => "pairwatch_reconnects_total",
            CounterMetric::DegenerateWindows => "pairwatch_degenerate_windows_total",
        }
    }
}

impl LatencyMetric {
    pub fn name(self) -> &'static str {
        match self {
            LatencyMetric::AnalyticsPass => "pairwatch_analytics_pass_latency_ms",
        }
    }
}

impl GaugeMetric {
    pub fn name(self) -> &'static str {
        match self {
            GaugeMetric::LatestZScore => "pairwatch_latest_zscore",
            GaugeMetric::AdfStatistic => "pairwatch_adf_statistic",
            GaugeMetric::AdfPValue => "pairwatch_adf_p_value",
            GaugeMetric::AlignedSamples => "pairwatch_aligned_samples",
        }
    }
}

/// Increment a counter
pub fn increment_counter(metric: CounterMetric, value: u64) {
    metrics::counter!(metric.name()).increment(value);
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    metrics::histogram!(metric.name()).record(duration.as_secs_f64() * 1000.0);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    metrics::gauge!(metric.name()).set(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_prefixed() {
        let names = [
            CounterMetric::TicksAppended.name(),
            CounterMetric::Reconnects.name(),
            LatencyMetric::AnalyticsPass.name(),
            GaugeMetric::AdfPValue.name(),
        ];
        assert!(names.iter().all(|n| n.starts_with("pairwatch_")));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        increment_counter(CounterMetric::MalformedEvents, 1);
        set_gauge(GaugeMetric::LatestZScore, 1.5);
        record_latency(LatencyMetric::AnalyticsPass, Duration::from_millis(3));
    }
}
