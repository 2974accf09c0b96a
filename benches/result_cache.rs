//! Benchmarks for replay lookups

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use replay_mock::model::{HttpMocker, MockerCommon};
use replay_mock::replay::ResultCache;
use replay_mock::{Category, ResultCodec};

fn bench_consume(c: &mut Criterion) {
    let mut group = c.benchmark_group("consume");

    for len in [1, 16, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            let cache = ResultCache::default();
            for i in 0..len {
                cache.record(Category::Http, "rec1", json!({"status": 200, "body": i}));
            }
            let query = HttpMocker {
                common: MockerCommon::replayed("rec1", "rep1"),
                ..HttpMocker::default()
            };

            b.iter(|| cache.get_record_result(Category::Http, black_box(&query)));
        });
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let codec = ResultCodec::default();

    for size in [100, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let item = HttpMocker {
                common: MockerCommon::replayed("rec1", "rep1"),
                method: "POST".to_string(),
                url: "/api/test".to_string(),
                response: "x".repeat(size),
                ..HttpMocker::default()
            };

            b.iter(|| codec.encode(Some(black_box(&item))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_consume, bench_encode);
criterion_main!(benches);
