//! Augmented Dickey-Fuller stationarity test
//!
//! Regression with a constant:
//! Δy_t = α + γ·y_{t-1} + Σ β_j·Δy_{t-j} + ε_t
//!
//! The statistic is the t-value of γ. p-values use MacKinnon's (1994) response
//! surface; critical values use MacKinnon (2010) finite-sample surfaces.

use super::ols::{self, OlsFit};
use super::{AnalyticsError, CriticalValues, StationarityResult};
use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Lag order selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum LagPolicy {
    /// Exactly this many lagged differences
    Fixed { lags: usize },
    /// Minimum AIC over 0..=max_lag; default max is 12·(n/100)^¼
    Aic {
        #[serde(default)]
        max_lag: Option<usize>,
    },
}

impl Default for LagPolicy {
    fn default() -> Self {
        LagPolicy::Aic { max_lag: None }
    }
}

/// Stationarity test parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdfConfig {
    pub lag_policy: LagPolicy,
    /// Shorter series are reported as insufficient data
    pub min_observations: usize,
    /// Verdict threshold on the p-value
    pub significance: f64,
}

impl Default for AdfConfig {
    fn default() -> Self {
        Self {
            lag_policy: LagPolicy::default(),
            min_observations: 20,
            significance: 0.05,
        }
    }
}

// MacKinnon (1994), constant only, one variable
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

// MacKinnon (2010), constant only, one variable: b0 + b1/n + b2/n² + b3/n³
const CRIT_1PCT: [f64; 4] = [-3.43035, -6.5393, -16.786, -79.433];
const CRIT_5PCT: [f64; 4] = [-2.86154, -2.8903, -4.234, -40.040];
const CRIT_10PCT: [f64; 4] = [-2.56677, -1.5384, -2.809, 0.0];

/// ADF tester
#[derive(Debug, Clone)]
pub struct StationarityTester {
    config: AdfConfig,
}

impl StationarityTester {
    pub fn new(config: AdfConfig) -> Result<Self, ConfigError> {
        if !(config.significance > 0.0 && config.significance < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "ADF significance must be in (0, 1), got {}",
                config.significance
            )));
        }
        if config.min_observations < 10 {
            return Err(ConfigError::Invalid(format!(
                "ADF min_observations must be at least 10, got {}",
                config.min_observations
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &AdfConfig {
        &self.config
    }

    /// Run the test over a spread series
    pub fn test(&self, series: &[f64]) -> Result<StationarityResult, AnalyticsError> {
        let n = series.len();
        if n < self.config.min_observations {
            return Err(AnalyticsError::InsufficientData {
                required: self.config.min_observations,
                available: n,
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(AnalyticsError::SingularRegression);
        }

        // Largest lag that still leaves more rows than parameters, with margin
        let feasible = (n / 2).saturating_sub(2);
        let diffs: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

        let (used_lag, fit, ic_best) = match self.config.lag_policy {
            LagPolicy::Fixed { lags } => {
                if lags > feasible {
                    return Err(AnalyticsError::InsufficientData {
                        required: 2 * (lags + 2),
                        available: n,
                    });
                }
                let fit = fit_lag(series, &diffs, lags, lags)
                    .ok_or(AnalyticsError::SingularRegression)?;
                (lags, fit, None)
            }
            LagPolicy::Aic { max_lag } => {
                let max_lag = max_lag.unwrap_or_else(|| default_max_lag(n)).min(feasible);
                let (best_lag, best_aic) = select_lag_aic(series, &diffs, max_lag)
                    .ok_or(AnalyticsError::SingularRegression)?;
                let fit = fit_lag(series, &diffs, best_lag, best_lag)
                    .ok_or(AnalyticsError::SingularRegression)?;
                (best_lag, fit, Some(best_aic))
            }
        };

        // Level coefficient is the first regressor
        let statistic = fit.t_value(0);
        if !statistic.is_finite() {
            return Err(AnalyticsError::SingularRegression);
        }
        let p_value = mackinnon_p_value(statistic);

        Ok(StationarityResult {
            statistic,
            p_value,
            critical_values: critical_values(fit.nobs),
            is_stationary: p_value < self.config.significance,
            used_lag,
            nobs: fit.nobs,
            ic_best,
        })
    }
}

/// Schwert's rule, 12·(n/100)^¼, rounded up
pub fn default_max_lag(n: usize) -> usize {
    (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize
}

/// Fit the ADF regression with `lag` lagged differences, using rows from
/// difference index `start` onward (`start >= lag`)
fn fit_lag(series: &[f64], diffs: &[f64], lag: usize, start: usize) -> Option<OlsFit> {
    let mut rows = Vec::with_capacity(diffs.len().saturating_sub(start));
    let mut y = Vec::with_capacity(diffs.len().saturating_sub(start));

    for i in start..diffs.len() {
        let mut row = Vec::with_capacity(lag + 2);
        row.push(series[i]);
        for j in 1..=lag {
            row.push(diffs[i - j]);
        }
        row.push(1.0);
        rows.push(row);
        y.push(diffs[i]);
    }

    ols::fit(&rows, &y)
}

/// Best (lag, aic) over a common sample trimmed by `max_lag`; ties keep the smaller lag
fn select_lag_aic(series: &[f64], diffs: &[f64], max_lag: usize) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for lag in 0..=max_lag {
        let Some(fit) = fit_lag(series, diffs, lag, max_lag) else {
            continue;
        };
        let aic = fit.aic();
        if best.map_or(true, |(_, best_aic)| aic < best_aic) {
            best = Some((lag, aic));
        }
    }
    best
}

/// Approximate p-value of the ADF statistic (constant, no trend)
pub fn mackinnon_p_value(statistic: f64) -> f64 {
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }
    let z = if statistic <= TAU_STAR {
        polyval(&TAU_SMALL_P, statistic)
    } else {
        polyval(&TAU_LARGE_P, statistic)
    };
    normal_cdf(z)
}

/// Finite-sample critical values for a regression with `nobs` observations
pub fn critical_values(nobs: usize) -> CriticalValues {
    let n = nobs as f64;
    let surface = |b: &[f64; 4]| b[0] + b[1] / n + b[2] / (n * n) + b[3] / (n * n * n);
    CriticalValues {
        one_pct: surface(&CRIT_1PCT),
        five_pct: surface(&CRIT_5PCT),
        ten_pct: surface(&CRIT_10PCT),
    }
}

/// c0 + c1·x + c2·x² + ...
fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Standard normal CDF approximation (Abramowitz and Stegun)
fn normal_cdf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs() / std::f64::consts::SQRT_2;

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    0.5 * (1.0 + sign * y)
}
