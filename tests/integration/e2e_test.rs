//! End-to-end integration tests

use chrono::{TimeZone, Utc};
use pairwatch::analytics::{
    AnalyticsError, AnalyticsPipeline, LatestWindow, Readiness, Signal, SignalStatus,
};
use pairwatch::config::Config;
use pairwatch::data::{load_tick_log, store_from_log, AppendOutcome, ParquetWriter, StreamStore};
use pairwatch::feed::Tick;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

const BASE_MS: i64 = 1_704_067_200_000;

fn config(window: usize) -> Config {
    let mut config: Config = toml::from_str(
        r#"
        [feed]
        symbol_a = "AAAUSDT"
        symbol_b = "BBBUSDT"
    "#,
    )
    .unwrap();
    config.analytics.window = window;
    config.validate().unwrap();
    config
}

fn tick(symbol: &str, secs: i64, price: Decimal) -> Tick {
    Tick::new(
        Utc.timestamp_millis_opt(BASE_MS + secs * 1000).unwrap(),
        symbol,
        price,
        dec!(1),
    )
}

#[test]
fn test_config_example_is_valid() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.feed.symbol_a, "ETHUSDT");
}

#[test]
fn test_three_tick_scenario_is_degenerate() {
    let config = config(2);
    let store = Arc::new(StreamStore::new());
    for (secs, a, b) in [
        (0, dec!(100), dec!(100)),
        (1, dec!(102), dec!(99)),
        (2, dec!(101), dec!(98)),
    ] {
        store.append(tick("AAAUSDT", secs, a));
        store.append(tick("BBBUSDT", secs, b));
    }

    let pipeline = AnalyticsPipeline::from_config(store, &config.feed, &config.analytics).unwrap();
    let report = pipeline.run_pass();

    let series = report.spread.as_ready().unwrap();
    assert_eq!(series.spread_values(), vec![0.0, 3.0, 3.0]);
    assert_eq!(series.latest, LatestWindow::Degenerate);
    assert_eq!(
        report.signal,
        SignalStatus::Unavailable {
            reason: AnalyticsError::DegenerateWindow
        }
    );
    assert_eq!(report.signal.signal(), Signal::NoTrade);
}

#[test]
fn test_out_of_order_tick_is_counted_not_raised() {
    let store = StreamStore::new();
    assert_eq!(store.append(tick("AAAUSDT", 5, dec!(10))), AppendOutcome::Appended);
    assert_eq!(
        store.append(tick("AAAUSDT", 4, dec!(11))),
        AppendOutcome::DroppedOutOfOrder
    );
    assert_eq!(store.len("AAAUSDT"), 1);
    assert_eq!(store.stats().dropped_out_of_order, 1);
}

#[test]
fn test_waiting_until_both_sides_have_data() {
    let config = config(2);
    let store = Arc::new(StreamStore::new());
    store.append(tick("AAAUSDT", 0, dec!(100)));

    let pipeline = AnalyticsPipeline::from_config(store, &config.feed, &config.analytics).unwrap();
    let report = pipeline.run_pass();

    assert!(matches!(
        report.aligned,
        Readiness::Waiting(AnalyticsError::InsufficientData { .. })
    ));
    assert_eq!(report.signal.signal(), Signal::NoTrade);
}

#[test]
fn test_captured_log_round_trip_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = ParquetWriter::new(dir.path().to_path_buf());
    writer.ensure_dir().unwrap();

    // Spread mean-reverts around 5 with deterministic noise
    let mut ticks = Vec::new();
    let mut state: u64 = 17;
    let mut spread = 5.0_f64;
    for i in 0..150i64 {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let noise = (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
        spread = 5.0 + 0.4 * (spread - 5.0) + noise;
        let a = Decimal::from_f64_retain(100.0 + spread).unwrap().round_dp(4);
        ticks.push(tick("AAAUSDT", i, a));
        ticks.push(tick("BBBUSDT", i, dec!(100)));
    }
    let path = writer.next_segment_path(Utc::now());
    writer.write_ticks(&path, &ticks).unwrap();

    let loaded = load_tick_log(dir.path()).unwrap();
    assert_eq!(loaded.ticks.len(), 300);
    assert_eq!(loaded.skipped_rows, 0);

    let config = config(30);
    let store = Arc::new(store_from_log(loaded));
    let report = AnalyticsPipeline::from_config(store, &config.feed, &config.analytics)
        .unwrap()
        .run_pass();

    assert_eq!(report.aligned.as_ready().unwrap().len(), 150);
    assert!(report.signal.zscore().is_some());
    let adf = report.stationarity.as_ready().unwrap();
    assert!(adf.is_stationary, "p-value {}", adf.p_value);
}

#[test]
fn test_missing_log_directory_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = load_tick_log(&dir.path().join("never-created")).unwrap();
    assert!(loaded.ticks.is_empty());
}
