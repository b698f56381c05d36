//! Configuration types for pairwatch

use crate::analytics::LagPolicy;
use crate::feed::BINANCE_WS_URL;
use crate::telemetry::LogFormat;
use crate::ws::WsConfig;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const EXAMPLE_CONFIG: &str = include_str!("../config.toml.example");

/// Configuration failures; fatal at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Price feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_exchange")]
    pub exchange: String,
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Instrument A of the pair
    pub symbol_a: String,
    /// Instrument B of the pair
    pub symbol_b: String,
}

fn default_exchange() -> String {
    "binance".to_string()
}
fn default_ws_url() -> String {
    BINANCE_WS_URL.to_string()
}

/// Connection loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// First reconnect delay
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Reconnect delay cap
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    /// Consecutive failed attempts before giving up (0 = retry forever)
    #[serde(default)]
    pub max_reconnect_attempts: u32,
}

fn default_initial_backoff_ms() -> u64 {
    500
}
fn default_max_backoff_ms() -> u64 {
    30_000
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_ping_interval_secs() -> u64 {
    30
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            connect_timeout_secs: 10,
            ping_interval_secs: 30,
            max_reconnect_attempts: 0,
        }
    }
}

impl CollectorConfig {
    /// WebSocket settings for a feed URL
    pub fn ws_config(&self, url: impl Into<String>) -> WsConfig {
        WsConfig::new(url)
            .max_reconnects(self.max_reconnect_attempts)
            .initial_delay(Duration::from_millis(self.initial_backoff_ms))
            .max_delay(Duration::from_millis(self.max_backoff_ms))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .ping_interval(Duration::from_secs(self.ping_interval_secs))
    }
}

/// Spread analytics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Seconds between analytics passes (1-60)
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,

    /// Rolling z-score window W (2-1000)
    #[serde(default = "default_window")]
    pub window: usize,

    /// Resample bucket width
    #[serde(default = "default_resample_interval_ms")]
    pub resample_interval_ms: u64,

    /// z above this: SELL_A_BUY_B
    #[serde(default = "default_upper_threshold")]
    pub upper_threshold: f64,

    /// z below this: BUY_A_SELL_B
    #[serde(default = "default_lower_threshold")]
    pub lower_threshold: f64,

    #[serde(default = "default_adf_significance")]
    pub adf_significance: f64,

    #[serde(default = "default_adf_min_observations")]
    pub adf_min_observations: usize,

    /// Lag order policy; pinned so results are reproducible
    #[serde(default)]
    pub adf_lag: LagPolicy,

    /// Only analyze ticks this recent (None = full history)
    #[serde(default)]
    pub lookback_secs: Option<u64>,
}

fn default_refresh_secs() -> u64 {
    5
}
fn default_window() -> usize {
    60
}
fn default_resample_interval_ms() -> u64 {
    1_000
}
fn default_upper_threshold() -> f64 {
    2.0
}
fn default_lower_threshold() -> f64 {
    -2.0
}
fn default_adf_significance() -> f64 {
    0.05
}
fn default_adf_min_observations() -> usize {
    20
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            refresh_secs: 5,
            window: 60,
            resample_interval_ms: 1_000,
            upper_threshold: 2.0,
            lower_threshold: -2.0,
            adf_significance: 0.05,
            adf_min_observations: 20,
            adf_lag: LagPolicy::default(),
            lookback_secs: None,
        }
    }
}

/// Data capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Persist ticks to Parquet while collecting
    #[serde(default)]
    pub capture_enabled: bool,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Ticks buffered before a flush
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_buffer_size() -> usize {
    500
}
fn default_flush_interval_secs() -> u64 {
    5
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            capture_enabled: false,
            output_dir: default_output_dir(),
            buffer_size: 500,
            flush_interval_secs: 5,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Prometheus exporter port; disabled when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path`, or the bundled example when the file does not exist
    ///
    /// Returns whether the example was used. Unreadable or malformed files are errors.
    pub fn load_or_example(path: impl AsRef<Path>) -> Result<(Self, bool), ConfigError> {
        match Self::load(path) {
            Ok(config) => Ok((config, false)),
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Ok((Self::example()?, true))
            }
            Err(e) => Err(e),
        }
    }

    /// The configuration shipped as `config.toml.example`
    pub fn example() -> Result<Self, ConfigError> {
        Ok(toml::from_str(EXAMPLE_CONFIG)?)
    }

    /// Reject settings that make the analytics meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        let feed = &self.feed;
        if !feed.exchange.eq_ignore_ascii_case("binance") {
            return invalid(format!("unsupported exchange '{}'", feed.exchange));
        }
        if feed.symbol_a.trim().is_empty() || feed.symbol_b.trim().is_empty() {
            return invalid("both symbols must be set".to_string());
        }
        if feed.symbol_a.eq_ignore_ascii_case(&feed.symbol_b) {
            return invalid(format!("symbols must differ, both are '{}'", feed.symbol_a));
        }

        let analytics = &self.analytics;
        if !(1..=60).contains(&analytics.refresh_secs) {
            return invalid(format!(
                "refresh_secs must be within 1-60, got {}",
                analytics.refresh_secs
            ));
        }
        if !(2..=1000).contains(&analytics.window) {
            return invalid(format!(
                "window must be within 2-1000, got {}",
                analytics.window
            ));
        }
        if analytics.resample_interval_ms == 0 {
            return invalid("resample_interval_ms must be positive".to_string());
        }
        if !analytics.upper_threshold.is_finite() || !analytics.lower_threshold.is_finite() {
            return invalid("z-score thresholds must be finite".to_string());
        }
        if analytics.upper_threshold <= analytics.lower_threshold {
            return invalid(format!(
                "upper_threshold {} must exceed lower_threshold {}",
                analytics.upper_threshold, analytics.lower_threshold
            ));
        }
        if !(analytics.adf_significance > 0.0 && analytics.adf_significance < 1.0) {
            return invalid(format!(
                "adf_significance must be in (0, 1), got {}",
                analytics.adf_significance
            ));
        }
        if analytics.adf_min_observations < 10 {
            return invalid(format!(
                "adf_min_observations must be at least 10, got {}",
                analytics.adf_min_observations
            ));
        }
        if analytics.lookback_secs == Some(0) {
            return invalid("lookback_secs must be positive when set".to_string());
        }

        let collector = &self.collector;
        if collector.initial_backoff_ms == 0
            || collector.max_backoff_ms < collector.initial_backoff_ms
        {
            return invalid(format!(
                "backoff must satisfy 0 < initial ({}) <= max ({})",
                collector.initial_backoff_ms, collector.max_backoff_ms
            ));
        }
        if collector.connect_timeout_secs == 0 || collector.ping_interval_secs == 0 {
            return invalid(
                "connect_timeout_secs and ping_interval_secs must be positive".to_string(),
            );
        }

        if self.data.buffer_size == 0 || self.data.flush_interval_secs == 0 {
            return invalid(
                "data buffer_size and flush_interval_secs must be positive".to_string(),
            );
        }

        Ok(())
    }
}

fn invalid(message: String) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(message))
}
