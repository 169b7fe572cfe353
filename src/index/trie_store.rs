//! Posting store backed by a [`PrefixBitTrie`].
//!
//! Each posting is one trie key, `(term << 32) | row`, so a term's rows are
//! a contiguous key range and every seek is a single `ceil`.

use crate::error::Result;
use crate::index::store::{PostingStore, StoreStats};
use crate::index::types::{RowId, Term};
use crate::trie::PrefixBitTrie;

const ROW_BITS: u32 = 32;

#[derive(Debug, Clone)]
pub struct TriePostingStore {
    trie: PrefixBitTrie,
}

#[inline]
fn key(term: Term, row: RowId) -> u64 {
    ((term as u64) << ROW_BITS) | (row as u32 as u64)
}

#[inline]
fn split(key: u64) -> (Term, RowId) {
    ((key >> ROW_BITS) as Term, key as u32 as RowId)
}

impl TriePostingStore {
    pub fn new(term_bits: u32, initial_pages: u32) -> Result<Self> {
        Ok(Self {
            trie: PrefixBitTrie::new(term_bits + ROW_BITS, 0, initial_pages)?,
        })
    }

    /// Underlying trie, for diagnostics
    pub fn trie(&self) -> &PrefixBitTrie {
        &self.trie
    }

    /// Keys are masked by the trie; a term wider than the configured
    /// width is simply never present.
    #[inline]
    fn in_range(&self, term: Term) -> bool {
        (term as u64) >> (self.trie.address_bits() - ROW_BITS) == 0
    }

    /// `ceil` for a key already checked with `in_range`.
    fn ceil_key(&self, key: u64) -> Option<u64> {
        let found = self.trie.ceil(key);
        debug_assert!(found.is_ok(), "key {:#x} outside trie mask", key);
        found.ok().flatten()
    }
}

impl PostingStore for TriePostingStore {
    const MAX_TERM_BITS: u32 = 30;

    fn seek_term(&self, term: Term) -> Option<Term> {
        if !self.in_range(term) {
            return None;
        }
        let found = self.ceil_key(key(term, 0))?;
        Some(split(found).0)
    }

    fn seek_term_row(&self, term: Term, row: RowId) -> Option<RowId> {
        if !self.in_range(term) {
            return None;
        }
        let found = self.ceil_key(key(term, row))?;
        let (found_term, found_row) = split(found);
        (found_term == term).then_some(found_row)
    }

    fn contains(&self, term: Term, row: RowId) -> bool {
        self.in_range(term) && matches!(self.trie.get(key(term, row)), Ok(Some(_)))
    }

    fn add(&mut self, term: Term, row: RowId) -> Result<()> {
        self.trie.put(key(term, row))
    }

    fn remove(&mut self, term: Term, row: RowId) -> Result<()> {
        self.trie.remove(key(term, row))
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            backend: "trie".to_string(),
            postings: self.trie.len(),
            memory_bytes: self.trie.memory_bytes() as u64,
            pages: Some(self.trie.pages()),
            slots_used: Some(self.trie.slots_used()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(key(1, 0), 1 << 32);
        assert_eq!(key(3, 7), (3 << 32) | 7);
        assert_eq!(split(key(0x3FFF_FFFF, i32::MAX)), (0x3FFF_FFFF, i32::MAX));
    }

    #[test]
    fn test_inverted_map() {
        let mut store = TriePostingStore::new(18, 1).unwrap();
        store.add(100, 10).unwrap();
        store.add(200, 20).unwrap();
        store.add(300, 30).unwrap();
        store.add(200, 120).unwrap();

        assert!(store.contains(100, 10));
        assert!(!store.contains(100, 20));
        assert!(store.contains(200, 20));
        assert!(!store.contains(200, 30));
        assert!(store.contains(200, 120));
        assert!(store.contains(300, 30));

        assert_eq!(store.seek_term_row(100, 0), Some(10));
        assert_eq!(store.seek_term_row(100, 10), Some(10));
        assert_eq!(store.seek_term_row(100, 11), None);
        assert_eq!(store.seek_term_row(200, 21), Some(120));
        assert_eq!(store.seek_term_row(200, 121), None);
        assert_eq!(store.seek_term_row(400, 0), None);

        assert_eq!(store.seek_term(0), Some(100));
        assert_eq!(store.seek_term(100), Some(100));
        assert_eq!(store.seek_term(101), Some(200));
        assert_eq!(store.seek_term(201), Some(300));
        assert_eq!(store.seek_term(301), None);

        store.remove(100, 10).unwrap();
        assert_eq!(store.seek_term(0), Some(200));

        store.remove(200, 20).unwrap();
        assert_eq!(store.seek_term(0), Some(200));
        assert_eq!(store.seek_term_row(200, 0), Some(120));
        assert_eq!(store.stats().postings, 2);
    }

    #[test]
    fn test_out_of_range_term() {
        let mut store = TriePostingStore::new(12, 1).unwrap();
        store.add(5, 1).unwrap();
        assert!(!store.contains(1 << 12, 1));
        assert_eq!(store.seek_term(1 << 12), None);
        assert_eq!(store.seek_term_row(1 << 12, 0), None);
    }

    #[test]
    fn test_seeks_at_key_range_edges() {
        let widest = (1 << 12) - 1;
        let mut store = TriePostingStore::new(12, 1).unwrap();
        store.add(widest, i32::MAX).unwrap();
        store.add(0, 0).unwrap();

        assert_eq!(store.seek_term(0), Some(0));
        assert_eq!(store.seek_term(1), Some(widest));
        assert_eq!(store.seek_term(widest), Some(widest));
        assert_eq!(store.seek_term_row(widest, 0), Some(i32::MAX));
        assert_eq!(store.seek_term_row(widest, i32::MAX), Some(i32::MAX));
        assert_eq!(store.seek_term_row(0, 1), None);
    }

    #[test]
    fn test_stats_reports_pool() {
        let mut store = TriePostingStore::new(18, 2).unwrap();
        for row in 0..500 {
            store.add(row as Term % 7, row).unwrap();
        }
        let stats = store.stats();
        assert_eq!(stats.backend, "trie");
        assert_eq!(stats.postings, 500);
        assert!(stats.pages.unwrap() >= 2);
        assert!(stats.slots_used.unwrap() > 1);
        store.trie().check_invariants().unwrap();
    }
}
