//! Benchmarks for template lexing and variable flattening

use apid::template::tokenize;
use apid::variables::Variables;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use std::hint::black_box;

fn build_template(expressions: usize) -> String {
    (0..expressions)
        .map(|i| {
            if i % 4 == 0 {
                format!("/segment-{i}/{{% echo {i} %}}")
            } else {
                format!("/segment-{i}/{{{{ var.items.{i} }}}}")
            }
        })
        .collect()
}

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");

    for size in [10, 100, 1000] {
        let template = build_template(size);
        group.throughput(Throughput::Bytes(template.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &template, |b, t| {
            b.iter(|| tokenize(black_box(t)))
        });
    }

    group.finish();
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");

    for width in [4, 16, 64] {
        let mut vars = Variables::new();
        let items: Vec<_> = (0..width)
            .map(|i| json!({"id": i, "name": format!("item-{i}"), "tags": ["a", "b"]}))
            .collect();
        vars.insert(
            "var",
            json!({"items": items, "meta": {"page": 1, "per-page": width}}),
        );

        group.bench_with_input(BenchmarkId::from_parameter(width), &vars, |b, vars| {
            b.iter(|| black_box(vars).flatten())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tokenize, bench_flatten);
criterion_main!(benches);
