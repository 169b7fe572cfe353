//! Query and primitive benchmarks for fastngram
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fastngram::utils::NGramCodec;
use fastngram::{IntSequence, NGramIndex, PostingStore, PrefixBitTrie, RowId};

/// Synthetic log-like rows with a shared vocabulary
fn sample_rows(count: usize) -> Vec<String> {
    let words = [
        "request", "handler", "timeout", "user", "session", "cache", "miss", "fox", "quick",
        "partition", "replica", "commit",
    ];
    (0..count)
        .map(|i| {
            format!(
                "{} {} id={} {} {}",
                words[i % words.len()],
                words[(i * 7) % words.len()],
                i,
                words[(i * 3 + 1) % words.len()],
                words[(i / 5) % words.len()],
            )
        })
        .collect()
}

fn load<S: PostingStore>(mut index: NGramIndex<S>, rows: &[String]) -> NGramIndex<S> {
    for (row, text) in rows.iter().enumerate() {
        index.add_row(row as RowId, text).expect("add row");
    }
    index
}

fn bench_codec(c: &mut Criterion) {
    let codec = NGramCodec::new(3, 6).unwrap();
    let short = "A quick brown fox";
    let long = short.repeat(64);

    let mut group = c.benchmark_group("codec");
    group.bench_function("dense_terms_17b", |b| {
        b.iter(|| codec.dense_terms(black_box(short)))
    });
    group.bench_function("dense_terms_1kb", |b| {
        b.iter(|| codec.dense_terms(black_box(&long)))
    });
    group.bench_function("query_terms", |b| {
        b.iter(|| codec.query_terms(black_box("partition replica")))
    });
    group.finish();
}

fn bench_candidates(c: &mut Criterion) {
    let rows = sample_rows(20_000);
    let array = load(NGramIndex::with_array_store(3, 6).unwrap(), &rows);
    let trie = load(NGramIndex::with_trie_store(3, 6, 64).unwrap(), &rows);

    let mut group = c.benchmark_group("candidates");
    for query in ["fox", "timeout user", "id=1234", "e", "ch"] {
        group.bench_with_input(BenchmarkId::new("array", query), &query, |b, &q| {
            b.iter(|| array.candidates(black_box(q)).unwrap().rows().count())
        });
        group.bench_with_input(BenchmarkId::new("trie", query), &query, |b, &q| {
            b.iter(|| trie.candidates(black_box(q)).unwrap().rows().count())
        });
    }
    group.finish();
}

fn bench_screen(c: &mut Criterion) {
    let rows = sample_rows(20_000);
    let trie = load(NGramIndex::with_trie_store(3, 6, 64).unwrap(), &rows);

    c.bench_function("screen_trie", |b| {
        let mut row = 0;
        b.iter(|| {
            row = (row + 7919) % 20_000;
            trie.screen(black_box(row), black_box("session cache"))
        })
    });
}

fn bench_trie(c: &mut Criterion) {
    let mut group = c.benchmark_group("trie");

    group.bench_function("put_10k", |b| {
        b.iter(|| {
            let mut trie = PrefixBitTrie::new(50, 0, 1).unwrap();
            for i in 0..10_000u64 {
                trie.put(black_box((i * 2_654_435_761) & ((1 << 50) - 1))).unwrap();
            }
            trie.len()
        })
    });

    let mut trie = PrefixBitTrie::new(50, 0, 1).unwrap();
    for i in 0..100_000u64 {
        trie.put((i * 2_654_435_761) & ((1 << 50) - 1)).unwrap();
    }
    group.bench_function("ceil", |b| {
        let mut probe = 0u64;
        b.iter(|| {
            probe = (probe + 0x9E37_79B9) & ((1 << 50) - 1);
            trie.ceil(black_box(probe))
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_codec,
    bench_candidates,
    bench_screen,
    bench_trie,
);

criterion_main!(benches);
