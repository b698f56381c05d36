//! Spread & rolling z-score engine
//!
//! spread = price_a - price_b; the z-score at i uses the W spreads ending at i.
//! Windows with zero variance are excluded and reported, never emitted as inf/NaN.

use super::{
    AlignedSample, AnalyticsError, LatestWindow, Signal, SignalStatus, SpreadPoint, ZScoreSeries,
};
use crate::config::ConfigError;

/// Engine parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadConfig {
    /// Rolling window size W
    pub window: usize,
    /// z above this: SELL_A_BUY_B
    pub upper_threshold: f64,
    /// z below this: BUY_A_SELL_B
    pub lower_threshold: f64,
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            window: 60,
            upper_threshold: 2.0,
            lower_threshold: -2.0,
        }
    }
}

/// Rolling spread statistics and threshold signal
#[derive(Debug, Clone)]
pub struct SpreadEngine {
    config: SpreadConfig,
}

impl SpreadEngine {
    /// Create an engine; invalid parameters fail here, not mid-stream
    pub fn new(config: SpreadConfig) -> Result<Self, ConfigError> {
        if config.window < 2 {
            return Err(ConfigError::Invalid(format!(
                "window must be at least 2, got {}",
                config.window
            )));
        }
        if !config.upper_threshold.is_finite() || !config.lower_threshold.is_finite() {
            return Err(ConfigError::Invalid("z-score thresholds must be finite".into()));
        }
        if config.upper_threshold <= config.lower_threshold {
            return Err(ConfigError::Invalid(format!(
                "upper threshold {} must exceed lower threshold {}",
                config.upper_threshold, config.lower_threshold
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &SpreadConfig {
        &self.config
    }

    /// Compute the spread series and rolling z-scores
    pub fn compute(&self, samples: &[AlignedSample]) -> Result<ZScoreSeries, AnalyticsError> {
        let window = self.config.window;
        if samples.len() < window {
            return Err(AnalyticsError::InsufficientData {
                required: window,
                available: samples.len(),
            });
        }

        let spreads: Vec<(chrono::DateTime<chrono::Utc>, f64)> =
            samples.iter().map(|s| (s.bucket, s.spread())).collect();
        let values: Vec<f64> = spreads.iter().map(|(_, v)| *v).collect();

        let mut points = Vec::with_capacity(values.len() + 1 - window);
        let mut degenerate_windows = 0;
        let mut latest = LatestWindow::Degenerate;

        for end in (window - 1)..values.len() {
            let slice = &values[end + 1 - window..=end];
            match window_zscore(slice) {
                Some((mean, std, zscore)) => {
                    points.push(SpreadPoint {
                        timestamp: spreads[end].0,
                        spread: values[end],
                        mean,
                        std,
                        zscore,
                    });
                    latest = LatestWindow::Valid { zscore };
                }
                None => {
                    degenerate_windows += 1;
                    latest = LatestWindow::Degenerate;
                }
            }
        }

        if degenerate_windows > 0 {
            tracing::debug!(degenerate_windows, window, "Skipped zero-variance windows");
        }

        Ok(ZScoreSeries {
            window,
            spreads,
            points,
            degenerate_windows,
            latest,
        })
    }

    /// Signal from the latest window only
    pub fn signal(&self, series: &ZScoreSeries) -> SignalStatus {
        match series.latest {
            LatestWindow::Valid { zscore } => SignalStatus::Ready {
                zscore,
                signal: self.classify(zscore),
            },
            LatestWindow::Degenerate => SignalStatus::Unavailable {
                reason: AnalyticsError::DegenerateWindow,
            },
        }
    }

    /// Map a z-score to a signal
    pub fn classify(&self, zscore: f64) -> Signal {
        if zscore > self.config.upper_threshold {
            Signal::SellABuyB
        } else if zscore < self.config.lower_threshold {
            Signal::BuyASellB
        } else {
            Signal::NoTrade
        }
    }
}

/// (mean, sample std, z of the last value), or None when undefined
fn window_zscore(slice: &[f64]) -> Option<(f64, f64, f64)> {
    let last = *slice.last()?;

    // Identical values have exactly zero deviation; don't let rounding in the mean
    // turn that into a tiny non-zero std
    if slice.iter().all(|v| *v == slice[0]) {
        return None;
    }

    let n = slice.len() as f64;
    let mean = slice.iter().sum::<f64>() / n;
    let variance = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = variance.sqrt();
    if std == 0.0 || !std.is_finite() {
        return None;
    }

    let zscore = (last - mean) / std;
    zscore.is_finite().then_some((mean, std, zscore))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn samples(spreads: &[f64]) -> Vec<AlignedSample> {
        let base = Utc.timestamp_opt(1_704_067_200, 0).unwrap();
        spreads
            .iter()
            .enumerate()
            .map(|(i, s)| AlignedSample {
                bucket: base + Duration::seconds(i as i64),
                price_a: 100.0 + s,
                price_b: 100.0,
            })
            .collect()
    }

    fn engine(window: usize) -> SpreadEngine {
        SpreadEngine::new(SpreadConfig {
            window,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_insufficient_data_below_window() {
        for window in 2..8 {
            let engine = engine(window);
            let series = samples(&vec![1.0; window - 1]);
            assert_eq!(
                engine.compute(&series),
                Err(AnalyticsError::InsufficientData {
                    required: window,
                    available: window - 1,
                })
            );
        }
    }

    #[test]
    fn test_constant_spread_is_degenerate() {
        let engine = engine(5);
        let series = engine.compute(&samples(&[3.7; 12])).unwrap();

        assert!(series.points.is_empty());
        assert_eq!(series.degenerate_windows, 8);
        assert_eq!(series.latest, LatestWindow::Degenerate);
        assert_eq!(
            engine.signal(&series),
            SignalStatus::Unavailable {
                reason: AnalyticsError::DegenerateWindow
            }
        );
        assert_eq!(engine.signal(&series).signal(), Signal::NoTrade);
    }

    #[test]
    fn test_rolling_statistics() {
        let engine = engine(3);
        let series = engine.compute(&samples(&[1.0, 2.0, 3.0, 5.0])).unwrap();

        assert_eq!(series.points.len(), 2);
        // window [1,2,3]: mean 2, sample std 1
        let first = series.points[0];
        assert!((first.mean - 2.0).abs() < 1e-12);
        assert!((first.std - 1.0).abs() < 1e-12);
        assert!((first.zscore - 1.0).abs() < 1e-12);
        // window [2,3,5]: mean 10/3
        let second = series.points[1];
        assert!((second.mean - 10.0 / 3.0).abs() < 1e-12);
        assert!(series.points.iter().all(|p| p.zscore.is_finite()));
    }

    /// Trailing values alternate around zero; the last one is placed `k` sample
    /// standard deviations above the mean of the window that contains it.
    fn deviating_series(window: usize, k: f64) -> Vec<f64> {
        let head: Vec<f64> = (0..window - 1)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        // Solve (x - mean(head ++ [x])) / std(head ++ [x]) = k for x by bisection
        let z_of = |x: f64| {
            let mut w = head.clone();
            w.push(x);
            window_zscore(&w).map(|(_, _, z)| z).unwrap_or(0.0)
        };
        let (mut lo, mut hi) = if k > 0.0 { (0.0, 1e6) } else { (-1e6, 0.0) };
        for _ in 0..200 {
            let mid = (lo + hi) / 2.0;
            if z_of(mid) < k {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let mut out = head;
        out.push((lo + hi) / 2.0);
        out
    }

    #[test]
    fn test_plus_three_sigma_sells_a() {
        let engine = engine(20);
        let series = engine.compute(&samples(&deviating_series(20, 3.0))).unwrap();
        let status = engine.signal(&series);
        assert!((status.zscore().unwrap() - 3.0).abs() < 1e-6);
        assert_eq!(status.signal(), Signal::SellABuyB);
    }

    #[test]
    fn test_minus_three_sigma_buys_a() {
        let engine = engine(20);
        let series = engine.compute(&samples(&deviating_series(20, -3.0))).unwrap();
        let status = engine.signal(&series);
        assert!((status.zscore().unwrap() + 3.0).abs() < 1e-6);
        assert_eq!(status.signal(), Signal::BuyASellB);
    }

    #[test]
    fn test_within_band_no_trade() {
        let engine = engine(20);
        let series = engine.compute(&samples(&deviating_series(20, 1.5))).unwrap();
        let status = engine.signal(&series);
        assert!(matches!(status, SignalStatus::Ready { .. }));
        assert_eq!(status.signal(), Signal::NoTrade);
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let engine = SpreadEngine::new(SpreadConfig {
            window: 20,
            upper_threshold: 1.0,
            lower_threshold: -1.0,
        })
        .unwrap();
        assert_eq!(engine.classify(1.5), Signal::SellABuyB);
        assert_eq!(engine.classify(-1.5), Signal::BuyASellB);
        assert_eq!(engine.classify(1.0), Signal::NoTrade);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(SpreadEngine::new(SpreadConfig {
            window: 1,
            ..Default::default()
        })
        .is_err());
        assert!(SpreadEngine::new(SpreadConfig {
            window: 10,
            upper_threshold: -1.0,
            lower_threshold: 1.0,
        })
        .is_err());
        assert!(SpreadEngine::new(SpreadConfig {
            window: 10,
            upper_threshold: f64::INFINITY,
            lower_threshold: -2.0,
        })
        .is_err());
    }

    #[test]
    fn test_degenerate_latest_after_valid_windows() {
        // spreads 0, 3, 3 with W=2: [0,3] valid, [3,3] degenerate
        let engine = engine(2);
        let series = engine.compute(&samples(&[0.0, 3.0, 3.0])).unwrap();
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.degenerate_windows, 1);
        assert_eq!(series.latest, LatestWindow::Degenerate);
        assert_eq!(engine.signal(&series).signal(), Signal::NoTrade);
    }
}
