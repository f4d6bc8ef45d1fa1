//! Suggestion latency benchmarks.
//!
//! Measures index building and query ranking at the default 600-name cap.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use compacter_search::{build_default_tag_index, extract_tags, SuggestionEngine};

fn library_names(count: usize) -> Vec<String> {
    let words = ["beach", "Alpine", "night", "東京旅行", "review", "family", "大阪", "drone"];
    (0..count)
        .map(|n| {
            format!(
                "{}-{} {} {} VID_{:04}",
                ["ABC", "XYZ", "MIX"][n % 3],
                n,
                words[n % words.len()],
                words[(n / 3) % words.len()],
                n
            )
        })
        .collect()
}

fn bench_extract_tags(c: &mut Criterion) {
    let names = library_names(100);
    let mut group = c.benchmark_group("extract_tags");
    group.throughput(Throughput::Elements(names.len() as u64));
    group.bench_function("100_names", |b| {
        b.iter(|| {
            for name in &names {
                black_box(extract_tags(black_box(name)));
            }
        })
    });
    group.finish();
}

fn bench_build_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_tag_index");
    for count in [100, 600] {
        let names = library_names(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &names, |b, names| {
            b.iter(|| black_box(build_default_tag_index(names)))
        });
    }
    group.finish();
}

fn bench_suggest(c: &mut Criterion) {
    let index = build_default_tag_index(library_names(600));
    let engine = SuggestionEngine::default();

    let mut group = c.benchmark_group("suggest");
    for query in ["a", "abc", "beach", "旅行", "vid0"] {
        group.bench_with_input(BenchmarkId::from_parameter(query), &query, |b, query| {
            b.iter(|| black_box(engine.suggest(black_box(query), &index, 10)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_extract_tags, bench_build_index, bench_suggest);
criterion_main!(benches);
