//! pairwatch: streaming pairs spread analytics for two Binance instruments
//!
//! This library provides the core components for:
//! - Real-time trade feeds from Binance with a reconnecting WebSocket client
//! - Tick normalization into a shared in-memory stream store
//! - Optional tick capture to Parquet
//! - Time-aligned resampling of the two tick streams
//! - Rolling spread z-score and mean-reversion signal
//! - Augmented Dickey-Fuller stationarity test on the spread
//! - Logging and Prometheus metrics

pub mod analytics;
pub mod cli;
pub mod collector;
pub mod config;
pub mod data;
pub mod feed;
pub mod report;
pub mod telemetry;
pub mod ws;
