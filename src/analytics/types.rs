//! Analytics types

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Analytics "not ready" states; never fatal, surfaced to the renderer
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalyticsError {
    /// Not enough history yet for the requested computation
    #[error("Insufficient data: need {required}, have {available}")]
    InsufficientData { required: usize, available: usize },
    /// Rolling window has zero variance; z-score undefined
    #[error("Degenerate window: zero standard deviation")]
    DegenerateWindow,
    /// Regression design is singular or fits perfectly; statistic undefined
    #[error("Singular regression: test statistic undefined")]
    SingularRegression,
}

/// One time bucket where both instruments have a resampled price
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignedSample {
    /// Bucket start (epoch-aligned)
    pub bucket: DateTime<Utc>,
    /// Last price of instrument A in the bucket
    pub price_a: f64,
    /// Last price of instrument B in the bucket
    pub price_b: f64,
}

impl AlignedSample {
    pub fn spread(&self) -> f64 {
        self.price_a - self.price_b
    }
}

/// A spread observation with a defined z-score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpreadPoint {
    pub timestamp: DateTime<Utc>,
    pub spread: f64,
    /// Rolling mean of the window ending here
    pub mean: f64,
    /// Rolling sample standard deviation (N-1) of the window ending here
    pub std: f64,
    pub zscore: f64,
}

/// Whether the most recent window produced a z-score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LatestWindow {
    Valid { zscore: f64 },
    Degenerate,
}

/// Output of the spread & z-score engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZScoreSeries {
    pub window: usize,
    /// Raw spread for every aligned sample
    pub spreads: Vec<(DateTime<Utc>, f64)>,
    /// Rows with a defined z-score; warm-up and degenerate windows excluded
    pub points: Vec<SpreadPoint>,
    /// Windows skipped for zero variance
    pub degenerate_windows: usize,
    pub latest: LatestWindow,
}

impl ZScoreSeries {
    /// Spread values in time order
    pub fn spread_values(&self) -> Vec<f64> {
        self.spreads.iter().map(|(_, s)| *s).collect()
    }
}

/// Mean-reversion trading signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    /// Spread rich: sell A, buy B
    SellABuyB,
    /// Spread cheap: buy A, sell B
    BuyASellB,
    NoTrade,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::SellABuyB => write!(f, "SELL_A_BUY_B"),
            Signal::BuyASellB => write!(f, "BUY_A_SELL_B"),
            Signal::NoTrade => write!(f, "NO_TRADE"),
        }
    }
}

/// Signal with its availability
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignalStatus {
    Ready { zscore: f64, signal: Signal },
    Unavailable { reason: AnalyticsError },
}

impl SignalStatus {
    /// Effective signal; anything unavailable means no trade
    pub fn signal(&self) -> Signal {
        match self {
            SignalStatus::Ready { signal, .. } => *signal,
            SignalStatus::Unavailable { .. } => Signal::NoTrade,
        }
    }

    pub fn zscore(&self) -> Option<f64> {
        match self {
            SignalStatus::Ready { zscore, .. } => Some(*zscore),
            SignalStatus::Unavailable { .. } => None,
        }
    }
}

/// ADF critical values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CriticalValues {
    #[serde(rename = "1%")]
    pub one_pct: f64,
    #[serde(rename = "5%")]
    pub five_pct: f64,
    #[serde(rename = "10%")]
    pub ten_pct: f64,
}

/// Augmented Dickey-Fuller test outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationarityResult {
    pub statistic: f64,
    pub p_value: f64,
    pub critical_values: CriticalValues,
    /// `p_value < significance`
    pub is_stationary: bool,
    /// Lagged differences in the final regression
    pub used_lag: usize,
    /// Observations in the final regression
    pub nobs: usize,
    /// Best AIC when the lag was selected automatically
    pub ic_best: Option<f64>,
}

/// A computation result or the reason it is not available yet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Readiness<T> {
    Ready(T),
    Waiting(AnalyticsError),
}

impl<T> Readiness<T> {
    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Readiness::Ready(value) => Some(value),
            Readiness::Waiting(_) => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready(_))
    }
}

impl<T> From<Result<T, AnalyticsError>> for Readiness<T> {
    fn from(result: Result<T, AnalyticsError>) -> Self {
        match result {
            Ok(value) => Readiness::Ready(value),
            Err(reason) => Readiness::Waiting(reason),
        }
    }
}

/// Everything one analytics pass hands to a renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub generated_at: DateTime<Utc>,
    pub symbol_a: String,
    pub symbol_b: String,
    pub aligned: Readiness<Vec<AlignedSample>>,
    pub spread: Readiness<ZScoreSeries>,
    pub signal: SignalStatus,
    pub stationarity: Readiness<StationarityResult>,
    /// Wall time spent in the pass
    pub elapsed_micros: u64,
}
