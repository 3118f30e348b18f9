//! Benchmarks for data processing operations
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use starlink_dash::backend::SimulatedSource;
use starlink_dash::charts::{ChartBuilder, ChartSettings};
use starlink_dash::downsample::{downsample, downsample_series, AggregationMethod};
use starlink_dash::history::RollingMax;
use starlink_dash::telemetry::Revision;
use starlink_dash::TelemetrySnapshot;

const END: i64 = 1_792_396_800;

fn bench_downsample(c: &mut Criterion) {
    let mut group = c.benchmark_group("downsample");

    // A full day of one-second samples
    let source_size = 86_400;
    let values: Vec<f64> = (0..source_size).map(|i| 40.0 + (i as f64 / 60.0).sin() * 10.0).collect();
    group.throughput(Throughput::Elements(source_size as u64));

    for method in AggregationMethod::ALL {
        group.bench_with_input(
            BenchmarkId::new("day_to_200", method),
            &method,
            |b, &method| {
                b.iter(|| black_box(downsample(black_box(&values), method, 200)));
            },
        );
    }

    let timestamps: Vec<f64> = (0..source_size).map(|i| i as f64).collect();
    for target_size in [100, 200, 1000, 5000] {
        group.bench_with_input(
            BenchmarkId::new("series_max", target_size),
            &target_size,
            |b, &target_size| {
                b.iter(|| {
                    black_box(downsample_series(
                        &timestamps,
                        &values,
                        AggregationMethod::Max,
                        target_size,
                    ))
                });
            },
        );
    }

    group.finish();
}

fn bench_snapshot_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_parsing");

    for secs in [600u64, 3_600, 86_400] {
        let json = serde_json::to_string(&SimulatedSource::new().snapshot_at(END, secs))
            .expect("serialize snapshot");
        group.throughput(Throughput::Bytes(json.len() as u64));
        group.bench_with_input(BenchmarkId::new("from_json", secs), &json, |b, json| {
            b.iter(|| black_box(TelemetrySnapshot::from_json(json).expect("parse")));
        });
    }

    group.finish();
}

fn bench_chart_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("chart_building");

    for secs in [600u64, 3_600, 43_200, 86_400] {
        let snapshot = SimulatedSource::new().snapshot_at(END, secs);
        let settings = ChartSettings {
            history_records: secs as usize,
            ..ChartSettings::default()
        };
        let preferred = Revision::for_history_secs(secs);

        group.bench_with_input(BenchmarkId::new("dashboard", secs), &snapshot, |b, snapshot| {
            let mut builder = ChartBuilder::new(settings.clone());
            b.iter(|| black_box(builder.build(snapshot, preferred)));
        });
    }

    group.finish();
}

fn bench_rolling_max(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolling_max");

    for capacity in [10, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::new("push_and_max", capacity),
            &capacity,
            |b, &capacity| {
                let mut rolling = RollingMax::new(capacity);
                let mut i = 0u64;
                b.iter(|| {
                    i += 1;
                    black_box(rolling.push_and_max((i % 97) as f64))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_downsample,
    bench_snapshot_parsing,
    bench_chart_building,
    bench_rolling_max,
);

criterion_main!(benches);
