//! User data parsing benchmarks
//!
//! Covers plain sets, inferred merge masks, updates with transforms and query values.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::json;
use std::hint::black_box;
use user_data_reader::{DatabaseId, RawValue, Sentinel, UserDataReader};

fn sample_document(width: usize) -> RawValue {
    let fields = (0..width).map(|i| {
        (
            format!("field{i}"),
            RawValue::from(json!({
                "name": format!("entry {i}"),
                "score": i as f64 * 1.5,
                "tags": ["a", "b", "c"],
                "meta": {"created": i, "active": i % 2 == 0},
            })),
        )
    });
    RawValue::map(fields)
}

fn bench_writes(c: &mut Criterion) {
    let reader = UserDataReader::builder(DatabaseId::default_for("bench")).build();
    let mut group = c.benchmark_group("writes");

    for width in [1usize, 10, 100] {
        let document = sample_document(width);
        group.throughput(Throughput::Elements(width as u64));

        group.bench_with_input(BenchmarkId::new("set", width), &document, |b, doc| {
            b.iter(|| black_box(reader.parsed_set_data(black_box(doc))))
        });
        group.bench_with_input(BenchmarkId::new("merge", width), &document, |b, doc| {
            b.iter(|| black_box(reader.parsed_merge_data(black_box(doc), None)))
        });
    }

    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let reader = UserDataReader::builder(DatabaseId::default_for("bench")).build();
    let update = RawValue::map([
        ("stats.count", RawValue::from(Sentinel::increment(1))),
        ("stats.updated", RawValue::from(Sentinel::server_timestamp())),
        ("tags", RawValue::from(Sentinel::array_union(["x", "y"]))),
        ("profile.name", RawValue::from("Ada")),
        ("obsolete", RawValue::from(Sentinel::delete())),
    ]);

    c.bench_function("update_with_transforms", |b| {
        b.iter(|| black_box(reader.parsed_update_data(black_box(&update))))
    });
}

fn bench_query(c: &mut Criterion) {
    let reader = UserDataReader::builder(DatabaseId::default_for("bench")).build();
    let values = RawValue::from(json!([1, 2, [3, 4], "five", {"six": 6}]));

    c.bench_function("query_array_argument", |b| {
        b.iter(|| black_box(reader.parsed_query_value(black_box(&values), true)))
    });
}

criterion_group!(benches, bench_writes, bench_update, bench_query);
criterion_main!(benches);
