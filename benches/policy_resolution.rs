//! Version policy benchmarks.
//!
//! Measures document decoding and resolution over large version lists.

use std::num::NonZeroUsize;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use servable_core::models::VersionPolicy;

fn available(count: u64) -> Vec<u64> {
    (1..=count).collect()
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy_resolve");

    let policies = [
        ("all", VersionPolicy::All),
        (
            "latest_3",
            VersionPolicy::Latest {
                num_versions: NonZeroUsize::new(3).unwrap(),
            },
        ),
        (
            "specific_16",
            VersionPolicy::Specific {
                versions: (1..=1024).step_by(64).collect(),
            },
        ),
    ];

    for count in [16u64, 1024] {
        let versions = available(count);
        group.throughput(Throughput::Elements(count));
        for (name, policy) in &policies {
            group.bench_with_input(BenchmarkId::new(*name, count), &versions, |b, v| {
                b.iter(|| policy.resolve(black_box(v)))
            });
        }
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy_decode");

    let documents = [
        ("all", json!({"all": {}})),
        ("latest", json!({"latest": {"num_versions": 2}})),
        ("specific", json!({"specific": {"versions": (1..=64).collect::<Vec<u64>>()}})),
    ];

    for (name, document) in &documents {
        group.bench_with_input(BenchmarkId::new("document", name), document, |b, doc| {
            b.iter(|| VersionPolicy::from_document(black_box(doc)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_decode);
criterion_main!(benches);
