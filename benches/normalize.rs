//! Criterion benchmarks for response normalization.
//!
//! Run with:
//!   cargo bench
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{Map, Value};

use lifeview::normalize;

fn make_grid(size: usize, seed: usize) -> Value {
    let rows = (0..size)
        .map(|r| {
            Value::Array(
                (0..size)
                    .map(|c| Value::from(u8::from((r * 31 + c * 17 + seed) % 3 == 0)))
                    .collect(),
            )
        })
        .collect();
    Value::Array(rows)
}

fn keyed_payload(count: usize, size: usize) -> Value {
    let mut map = Map::new();
    for i in (0..count).rev() {
        map.insert(format!("grid_{i}"), make_grid(size, i));
    }
    Value::Object(map)
}

/// Keyed payloads need sorting; wrapped ones are a move.
fn bench_shapes(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for count in [1usize, 8, 64].iter() {
        group.throughput(Throughput::Elements(*count as u64));

        let keyed = keyed_payload(*count, 50);
        group.bench_with_input(BenchmarkId::new("keyed", count), &keyed, |b, payload| {
            b.iter(|| black_box(normalize(Some(payload.clone())).len()));
        });

        let wrapped = serde_json::json!({
            "grids": (0..*count).map(|i| make_grid(50, i)).collect::<Vec<_>>(),
        });
        group.bench_with_input(BenchmarkId::new("wrapped", count), &wrapped, |b, payload| {
            b.iter(|| black_box(normalize(Some(payload.clone())).len()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_shapes);
criterion_main!(benches);
