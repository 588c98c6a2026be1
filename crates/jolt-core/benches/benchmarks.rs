//! Criterion benchmarks for compiled transforms.
//!
//! Specs are compiled and inputs built outside the benchmark loop so only
//! the walk itself is measured.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use jolt_core::{Chainr, Modifier, Shiftr};

/// Load and parse one file of a chain fixture.
fn load_fixture(case: &str, file: &str) -> Value {
    let fixtures_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");
    let path = Path::new(fixtures_dir).join(case).join(file);
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// `n` rating records keyed `rating-0`..`rating-n`.
fn ratings(n: usize) -> Value {
    let map = (0..n)
        .map(|i| {
            (
                format!("rating-{i}"),
                json!({"value": i % 5, "max": 5, "label": format!("r{i}")}),
            )
        })
        .collect::<serde_json::Map<_, _>>();
    json!({ "ratings": map, "meta": {"source": "bench"} })
}

fn bench_shift_literals(c: &mut Criterion) {
    let shiftr = Shiftr::new(&json!({"meta": {"source": "info.source"}})).unwrap();
    let input = ratings(10);

    c.bench_function("shift/literals", |b| {
        b.iter(|| shiftr.apply(black_box(&input)).unwrap())
    });
}

fn bench_shift_wildcards(c: &mut Criterion) {
    let shiftr = Shiftr::new(&json!({
        "ratings": {
            "rating-*": {
                "value": "byId.&(1,1).score",
                "label": "labels[]",
                "$": "ids[]"
            }
        },
        "*": "&"
    }))
    .unwrap();
    let input = ratings(500);

    c.bench_function("shift/wildcards_500", |b| {
        b.iter(|| shiftr.apply(black_box(&input)).unwrap())
    });
}

fn bench_modify_functions(c: &mut Criterion) {
    let modifier = Modifier::overwrite(&json!({
        "ratings": {
            "*": {
                "label": "=toUpper",
                "ratio": "=divide(@(1,value), @(1,max))"
            }
        }
    }))
    .unwrap();
    let input = ratings(500);
    let context = json!({});

    c.bench_function("modify/overwrite_500", |b| {
        b.iter(|| modifier.apply(black_box(input.clone()), black_box(&context)).unwrap())
    });
}

fn bench_chain_fixture(c: &mut Criterion) {
    let chain = Chainr::from_spec(&load_fixture("user_profile_chain", "spec.json")).unwrap();
    let input = load_fixture("user_profile_chain", "input.json");

    c.bench_function("chain/user_profile", |b| {
        b.iter(|| chain.transform(black_box(input.clone())).unwrap())
    });
}

criterion_group!(
    benches,
    bench_shift_literals,
    bench_shift_wildcards,
    bench_modify_functions,
    bench_chain_fixture,
);
criterion_main!(benches);
