//! Spread analytics
//!
//! Resampling, rolling z-score, ADF stationarity test and the pass that ties
//! them together.

pub mod adf;
mod ols;
mod pipeline;
mod resample;
pub mod spread;
mod types;

pub use adf::{AdfConfig, LagPolicy, StationarityTester};
pub use pipeline::AnalyticsPipeline;
pub use resample::{bucket_start, resample};
pub use spread::{SpreadConfig, SpreadEngine};
pub use types::{
    AlignedSample, AnalyticsError, AnalyticsReport, CriticalValues, LatestWindow, Readiness,
    Signal, SignalStatus, SpreadPoint, StationarityResult, ZScoreSeries,
};
