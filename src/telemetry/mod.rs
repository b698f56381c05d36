//! Telemetry module
//!
//! Logging and Prometheus metrics

mod logging;
mod metrics;

pub(crate) use logging::fmt_layer;
pub use logging::{init_logging, LogFormat};
pub use metrics::{
    increment_counter, record_latency, set_gauge, CounterMetric, GaugeMetric, LatencyMetric,
};

use crate::config::TelemetryConfig;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<()> {
    init_logging(&config.log_level, config.log_format)?;

    if let Some(port) = config.metrics_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        // Metrics are optional; a busy port must not stop ingestion
        match PrometheusBuilder::new().with_http_listener(addr).install() {
            Ok(()) => tracing::info!(%addr, "Prometheus metrics exporter started"),
            Err(e) => tracing::warn!(%addr, error = %e, "Failed to start metrics exporter"),
        }
    }

    Ok(())
}
