//! Word Counting and Daily Aggregation Benchmarks
//!
//! Measures tokenization throughput over document-sized texts and the cost of
//! folding revision histories into daily stats, in memory and through the
//! database.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use chrono::{Duration, TimeZone, Utc};

use docstats::stats::{daily, DocumentStat, RevisionStat, WordCounter};
use docstats::store::StatStore;

const VOCABULARY: &[&str] = &[
    "chapter", "morning", "garden", "letter", "window", "silence", "river", "quietly",
    "the", "and", "of", "was", "evening", "stranger", "promise", "harbour",
];

/// Pseudo-prose of `words` words drawn from a fixed vocabulary
fn create_text(words: usize) -> String {
    (0..words)
        .map(|i| VOCABULARY[(i * 7 + i / 3) % VOCABULARY.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

/// Documents with `revisions` revisions each, spread over consecutive hours
fn create_documents(documents: usize, revisions: usize) -> Vec<DocumentStat> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..documents)
        .map(|d| {
            let revisions = (0..revisions)
                .map(|r| RevisionStat {
                    revision_id: format!("r{}", r),
                    user_name: "bench".to_string(),
                    modified_date: start + Duration::hours((r * 5 + d) as i64),
                    word_count: ((r * 37 + d * 11) % 2000) as u64,
                    word_freq: Vec::new(),
                })
                .collect();
            DocumentStat::new(format!("doc-{}", d), format!("Document {}", d), start, revisions)
        })
        .collect()
}

fn bench_word_counting(c: &mut Criterion) {
    let counter = WordCounter::default();
    let mut group = c.benchmark_group("word_counting");

    for words in [100, 1_000, 10_000, 100_000] {
        let text = create_text(words);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("sample", words), &text, |b, text| {
            b.iter(|| counter.sample(black_box(text)))
        });
    }
    group.finish();
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("daily_reduce");

    for (documents, revisions) in [(10, 50), (100, 50), (100, 500)] {
        let stats = create_documents(documents, revisions);
        group.throughput(Throughput::Elements((documents * revisions) as u64));
        group.bench_with_input(
            BenchmarkId::new("reduce", format!("{}x{}", documents, revisions)),
            &stats,
            |b, stats| b.iter(|| daily::reduce(black_box(stats))),
        );
    }
    group.finish();
}

fn bench_replace_daily_stats(c: &mut Criterion) {
    let store = StatStore::temporary().unwrap();
    let days = daily::reduce(&create_documents(50, 200));

    c.bench_function("replace_daily_stats", |b| {
        b.iter(|| store.replace_daily_stats(black_box(&days)).unwrap())
    });
}

criterion_group!(
    aggregation_benches,
    bench_word_counting,
    bench_reduce,
    bench_replace_daily_stats
);

criterion_main!(aggregation_benches);
