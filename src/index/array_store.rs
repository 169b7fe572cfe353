//! Direct-addressed posting store.
//!
//! One slot per possible term value, each holding a sorted posting list or
//! nothing. Lists grow and shrink in steps of `max(4, capacity / 256)`; a
//! list only shrinks once it has a full step of slack, so alternating
//! add/remove on a boundary does not reallocate every time.

use crate::error::{Error, Result};
use crate::index::store::{PostingStore, StoreStats};
use crate::index::types::{RowId, Term};
use tracing::debug;

const MIN_STEP: usize = 4;

#[derive(Debug, Clone, Default)]
struct PostingList {
    rows: Vec<RowId>,
}

impl PostingList {
    fn with_row(row: RowId) -> Self {
        let mut rows = Vec::with_capacity(MIN_STEP);
        rows.push(row);
        Self { rows }
    }

    #[inline]
    fn step(&self) -> usize {
        (self.rows.capacity() >> 8).max(MIN_STEP)
    }

    /// Returns false if the row was already present
    fn insert(&mut self, row: RowId) -> bool {
        match self.rows.binary_search(&row) {
            Ok(_) => false,
            Err(pos) => {
                if self.rows.len() == self.rows.capacity() {
                    let step = self.step();
                    self.rows.reserve_exact(step);
                }
                self.rows.insert(pos, row);
                true
            }
        }
    }

    /// Returns false if the row was absent
    fn remove(&mut self, row: RowId) -> bool {
        match self.rows.binary_search(&row) {
            Ok(pos) => {
                self.rows.remove(pos);
                let step = self.step();
                let capacity = self.rows.capacity();
                if self.rows.len() < capacity.saturating_sub(step) {
                    self.rows.shrink_to(capacity - step);
                }
                true
            }
            Err(_) => false,
        }
    }

    fn seek(&self, row: RowId) -> Option<RowId> {
        let pos = self.rows.partition_point(|&r| r < row);
        self.rows.get(pos).copied()
    }

    fn contains(&self, row: RowId) -> bool {
        self.rows.binary_search(&row).is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct ArrayPostingStore {
    table: Vec<Option<Box<PostingList>>>,
    postings: u64,
}

impl ArrayPostingStore {
    pub fn new(term_bits: u32) -> Self {
        debug_assert!(term_bits <= Self::MAX_TERM_BITS);
        debug!(term_bits, "created array posting store");
        Self {
            table: vec![None; 1usize << term_bits],
            postings: 0,
        }
    }

    #[inline]
    fn list(&self, term: Term) -> Option<&PostingList> {
        self.table.get(term as usize).and_then(|slot| slot.as_deref())
    }
}

impl PostingStore for ArrayPostingStore {
    const MAX_TERM_BITS: u32 = 24;

    fn seek_term(&self, term: Term) -> Option<Term> {
        let start = (term as usize).min(self.table.len());
        self.table[start..]
            .iter()
            .position(Option::is_some)
            .map(|offset| (start + offset) as Term)
    }

    fn seek_term_row(&self, term: Term, row: RowId) -> Option<RowId> {
        self.list(term)?.seek(row)
    }

    fn contains(&self, term: Term, row: RowId) -> bool {
        self.list(term).is_some_and(|list| list.contains(row))
    }

    fn add(&mut self, term: Term, row: RowId) -> Result<()> {
        let width = self.table.len();
        let Some(slot) = self.table.get_mut(term as usize) else {
            return Err(Error::argument(format!(
                "term {:#x} outside {} entry table",
                term, width
            )));
        };
        let inserted = match slot {
            Some(list) => list.insert(row),
            None => {
                *slot = Some(Box::new(PostingList::with_row(row)));
                true
            }
        };
        if inserted {
            self.postings += 1;
        }
        Ok(())
    }

    fn remove(&mut self, term: Term, row: RowId) -> Result<()> {
        let Some(slot) = self.table.get_mut(term as usize) else {
            return Ok(());
        };
        if let Some(list) = slot {
            if list.remove(row) {
                self.postings -= 1;
                if list.rows.is_empty() {
                    *slot = None;
                }
            }
        }
        Ok(())
    }

    fn stats(&self) -> StoreStats {
        let lists: usize = self
            .table
            .iter()
            .flatten()
            .map(|list| list.rows.capacity() * std::mem::size_of::<RowId>())
            .sum();
        StoreStats {
            backend: "array".to_string(),
            postings: self.postings,
            memory_bytes: (self.table.len() * std::mem::size_of::<Option<Box<PostingList>>>()
                + lists) as u64,
            pages: None,
            slots_used: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_map() {
        let mut store = ArrayPostingStore::new(18);
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
    }

    #[test]
    fn test_sorted_unique_postings() {
        let mut store = ArrayPostingStore::new(18);
        for row in [50, 30, 40, 10, 11, 12, 13, 14, 15, 120, 30] {
            store.add(200, row).unwrap();
        }
        assert_eq!(store.stats().postings, 10);

        assert_eq!(store.seek_term_row(200, 0), Some(10));
        assert_eq!(store.seek_term_row(200, 16), Some(30));
        assert_eq!(store.seek_term_row(200, 31), Some(40));
        assert_eq!(store.seek_term_row(200, 51), Some(120));

        for row in [12, 15, 40, 13, 30] {
            store.remove(200, row).unwrap();
        }
        assert_eq!(store.seek_term_row(200, 12), Some(14));
        assert_eq!(store.seek_term_row(200, 15), Some(50));
        assert_eq!(store.stats().postings, 5);

        // absent rows are ignored
        store.remove(200, 999).unwrap();
        store.remove(7, 1).unwrap();
        assert_eq!(store.stats().postings, 5);
    }

    #[test]
    fn test_list_growth_and_shrink() {
        let mut list = PostingList::with_row(0);
        for row in 1..2000 {
            list.insert(row);
        }
        let grown = list.rows.capacity();
        assert!(grown >= 2000);

        for row in 0..1990 {
            list.remove(row);
        }
        assert!(list.rows.capacity() < grown);
        assert_eq!(list.seek(0), Some(1990));
    }

    #[test]
    fn test_term_outside_table() {
        let mut store = ArrayPostingStore::new(10);
        assert!(store.add(1 << 10, 1).is_err());
        assert!(store.remove(1 << 10, 1).is_ok());
        assert!(!store.contains(1 << 10, 1));
        assert_eq!(store.seek_term(1 << 10), None);
    }

    #[test]
    fn test_empty_list_freed() {
        let mut store = ArrayPostingStore::new(10);
        store.add(5, 1).unwrap();
        store.remove(5, 1).unwrap();
        assert!(store.table[5].is_none());
        assert_eq!(store.seek_term(0), None);
    }
}
