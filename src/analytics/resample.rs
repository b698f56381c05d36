//! Time-aligned resampling of two tick streams
//!
//! Buckets are `interval` wide and epoch-aligned. Each bucket takes the last price
//! seen inside it; buckets missing either side are dropped (inner join, no forward
//! fill).

use super::{AlignedSample, AnalyticsError};
use crate::feed::Tick;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;

/// Resample two time-ordered tick sequences into an aligned bivariate series
pub fn resample(
    series_a: &[Tick],
    series_b: &[Tick],
    interval: Duration,
) -> Result<Vec<AlignedSample>, AnalyticsError> {
    if series_a.is_empty() || series_b.is_empty() {
        return Err(AnalyticsError::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    let interval_ms = interval.num_milliseconds().max(1);
    let buckets_a = last_per_bucket(series_a, interval_ms);
    let buckets_b = last_per_bucket(series_b, interval_ms);

    // Both inputs are bucket-ordered: merge join
    let mut aligned = Vec::with_capacity(buckets_a.len().min(buckets_b.len()));
    let (mut i, mut j) = (0, 0);
    while i < buckets_a.len() && j < buckets_b.len() {
        let (bucket_a, price_a) = buckets_a[i];
        let (bucket_b, price_b) = buckets_b[j];
        match bucket_a.cmp(&bucket_b) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                if let Some(bucket) = DateTime::from_timestamp_millis(bucket_a) {
                    aligned.push(AlignedSample {
                        bucket,
                        price_a,
                        price_b,
                    });
                }
                i += 1;
                j += 1;
            }
        }
    }

    Ok(aligned)
}

/// Epoch-aligned bucket start, correct for pre-1970 instants too
pub fn bucket_start(time: DateTime<Utc>, interval_ms: i64) -> i64 {
    time.timestamp_millis().div_euclid(interval_ms) * interval_ms
}

/// Collapse a time-ordered series to (bucket start ms, last price)
fn last_per_bucket(ticks: &[Tick], interval_ms: i64) -> Vec<(i64, f64)> {
    let mut out: Vec<(i64, f64)> = Vec::new();
    for tick in ticks {
        let Some(price) = tick.price.to_f64().filter(|p| p.is_finite()) else {
            continue;
        };
        let bucket = bucket_start(tick.time, interval_ms);
        match out.last_mut() {
            Some((last_bucket, last_price)) if *last_bucket == bucket => *last_price = price,
            _ => out.push((bucket, price)),
        }
    }
    out
}
