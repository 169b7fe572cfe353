//! Fixed-corpus search scenarios run against every index shape.
//!
//! Five-bit shapes fold the space character onto the zero padding, which
//! widens short-query candidate sets, so they only take part in the
//! randomized checks in `properties.rs`.

use fastngram::{Backend, IndexConfig, IntSequence, RowId, TextIndex};

const CORPUS: [&str; 6] = [
    "A quick brown fox",
    "MAKE IT QUICKLY",
    "foxhound",
    "-------------",
    "Few more foxes here",
    "",
];

/// Every exact shape: (ngram_size, bits_per_char, backend)
fn shapes() -> Vec<IndexConfig> {
    let mut configs = Vec::new();
    for (ngram_size, bits_per_char) in [(2, 6), (2, 7), (3, 6), (3, 7), (4, 6), (4, 7)] {
        let backends = if ngram_size * bits_per_char as usize <= 24 {
            vec![Backend::Array, Backend::Trie { initial_pages: 4 }]
        } else {
            vec![Backend::Trie { initial_pages: 4 }]
        };
        for backend in backends {
            configs.push(IndexConfig {
                ngram_size,
                bits_per_char,
                backend,
            });
        }
    }
    configs
}

fn load(config: &IndexConfig) -> TextIndex {
    let mut index = config.build().unwrap();
    for (row, text) in CORPUS.iter().enumerate() {
        index.add_row(row as RowId, text).unwrap();
    }
    index
}

fn assert_search(index: &TextIndex, config: &IndexConfig, query: &str, expected: &[RowId]) {
    let rows: Vec<RowId> = index.candidates(query).unwrap().rows().collect();
    assert_eq!(rows, expected, "query {:?} on {:?}", query, config);
}

#[test]
fn test_simple_search_cases() {
    for config in shapes() {
        let index = load(&config);
        assert_search(&index, &config, "fox", &[0, 2, 4]);
        assert_search(&index, &config, "quick", &[0, 1]);
        assert_search(&index, &config, "---", &[3]);
        assert_search(&index, &config, "more foxes", &[4]);
        assert_search(&index, &config, "MORE FOXES", &[4]);
        assert_search(&index, &config, "not found", &[]);
        assert_search(&index, &config, "f", &[0, 2, 4]);
        assert_search(&index, &config, " ", &[0, 1, 4]);
        assert_search(&index, &config, "e ", &[1, 4]);
    }
}

#[test]
fn test_simple_update_cases() {
    for config in shapes() {
        let mut index = load(&config);
        assert_search(&index, &config, "fox", &[0, 2, 4]);
        assert_search(&index, &config, "foxhound", &[2]);

        index.remove_row(2, CORPUS[2]).unwrap();
        assert_search(&index, &config, "fox", &[0, 4]);

        index.add_row(2, "white fox").unwrap();
        assert_search(&index, &config, "fox", &[0, 2, 4]);
        assert_search(&index, &config, "foxhound", &[]);
        assert_search(&index, &config, "white", &[2]);
        assert_search(&index, &config, "not found", &[]);
        assert_search(&index, &config, "f", &[0, 2, 4]);
        assert_search(&index, &config, " ", &[0, 1, 2, 4]);
        assert_search(&index, &config, "e ", &[1, 2, 4]);
    }
}

#[test]
fn test_screen_agrees_with_candidates() {
    for config in shapes() {
        let index = load(&config);
        for query in ["fox", "quick", "---", "f", " ", "e ", "more foxes", "zzz"] {
            let candidates = index.candidate_bitmap(query).unwrap();
            for row in 0..CORPUS.len() as RowId {
                assert_eq!(
                    index.screen(row, query).unwrap(),
                    candidates.contains(row as u32),
                    "row {} query {:?} on {:?}",
                    row,
                    query,
                    config
                );
            }
        }
    }
}

#[test]
fn test_index_only_boundary() {
    for config in shapes() {
        let index = load(&config);
        let n = config.ngram_size;
        assert!(index.is_index_only(""));
        assert!(index.is_index_only(&"x".repeat(n - 1)));
        assert!(!index.is_index_only(&"x".repeat(n)));
    }
}

#[test]
fn test_index_only_queries_are_exact() {
    for config in shapes() {
        let index = load(&config);
        for query in ["f", "x", " ", "e ", "qu", "zz"] {
            if !index.is_index_only(query) {
                continue;
            }
            let rows: Vec<RowId> = index.candidates(query).unwrap().rows().collect();
            let expected: Vec<RowId> = (0..CORPUS.len())
                .filter(|&row| !CORPUS[row].is_empty() && index.evaluate(CORPUS[row], query))
                .map(|row| row as RowId)
                .collect();
            assert_eq!(rows, expected, "query {:?} on {:?}", query, config);
        }
    }
}

#[test]
fn test_stats_track_postings() {
    for config in shapes() {
        let mut index = load(&config);
        let before = index.stats();
        assert!(before.terms > 0);
        assert!(before.store.postings >= before.terms);

        for (row, text) in CORPUS.iter().enumerate() {
            index.remove_row(row as RowId, text).unwrap();
        }
        let after = index.stats();
        assert_eq!(after.terms, 0, "{:?}", config);
        assert_eq!(after.store.postings, 0, "{:?}", config);
    }
}
