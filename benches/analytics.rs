//! Benchmarks for the analytics pass

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pairwatch::analytics::{
    AdfConfig, AnalyticsPipeline, SpreadConfig, SpreadEngine, StationarityTester,
};
use pairwatch::data::StreamStore;
use pairwatch::feed::Tick;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

/// One hour of 1s ticks for both legs
fn seeded_store() -> Arc<StreamStore> {
    let store = Arc::new(StreamStore::new());
    let base = Utc.timestamp_millis_opt(1_704_067_200_000).unwrap();
    let mut state: u64 = 1;
    for i in 0..3_600i64 {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let wiggle = Decimal::from((state >> 40) % 200) / dec!(100);
        let time = base + chrono::Duration::seconds(i);
        store.append(Tick::new(time, "ETHUSDT", dec!(2250) + wiggle, dec!(1)));
        store.append(Tick::new(time, "BTCUSDT", dec!(2245), dec!(1)));
    }
    store
}

fn benchmark_analytics_pass(c: &mut Criterion) {
    let pipeline = AnalyticsPipeline::new(
        seeded_store(),
        "ETHUSDT",
        "BTCUSDT",
        chrono::Duration::seconds(1),
        SpreadEngine::new(SpreadConfig::default()).unwrap(),
        StationarityTester::new(AdfConfig::default()).unwrap(),
    );

    c.bench_function("analytics_pass_3600", |b| {
        b.iter(|| black_box(pipeline.run_pass()))
    });
}

fn benchmark_adf(c: &mut Criterion) {
    let tester = StationarityTester::new(AdfConfig::default()).unwrap();
    let series: Vec<f64> = (0..1_000).map(|i| ((i * 37) % 101) as f64 / 10.0).collect();

    c.bench_function("adf_aic_1000", |b| {
        b.iter(|| tester.test(black_box(&series)))
    });
}

criterion_group!(benches, benchmark_analytics_pass, benchmark_adf);
criterion_main!(benches);
