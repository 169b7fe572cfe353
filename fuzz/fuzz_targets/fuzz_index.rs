#![no_main]

use fastngram::{IntSequence, NGramIndex};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (Vec<String>, String)| {
    // Every row containing the query must come back as a candidate
    let (rows, query) = input;
    // per-character lowercasing only agrees with whole-string lowercasing on ASCII
    if query.is_empty() || !query.is_ascii() {
        return;
    }
    let mut index = NGramIndex::with_trie_store(3, 7, 1).unwrap();
    for (row, text) in rows.iter().enumerate().take(64) {
        index.add_row(row as i32, text).unwrap();
    }

    let candidates: Vec<i32> = index.candidates(&query).unwrap().rows().collect();
    for (row, text) in rows.iter().enumerate().take(64) {
        if text.is_ascii() && index.evaluate(text, &query) {
            assert!(candidates.contains(&(row as i32)), "{:?} {:?}", text, query);
        }
    }
});
