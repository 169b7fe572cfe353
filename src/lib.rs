//! # fastngram - in-memory n-gram substring index
//!
//! fastngram narrows case-insensitive substring searches over a set of text
//! rows to a small candidate set, using fixed-width bit-packed n-grams and a
//! choice of two posting stores.
//!
//! ## Architecture
//!
//! - [`utils`] - n-gram encoding (normalization, dense and minimal coverage)
//! - [`index`] - the generic [`NGramIndex`] engine, posting stores and
//!   runtime configuration
//! - [`query`] - lazy candidate sequences (leapfrog intersection, union)
//! - [`trie`] - the page-allocated radix trie behind the compact store
//!
//! ## Quick Start
//!
//! ```
//! use fastngram::{IndexConfig, IntSequence};
//!
//! let mut index = IndexConfig::default().build().unwrap();
//! index.add_row(0, "A quick brown fox").unwrap();
//! index.add_row(1, "MAKE IT QUICKLY").unwrap();
//! index.add_row(2, "foxhound").unwrap();
//!
//! let rows: Vec<i32> = index.candidates("fox").unwrap().rows().collect();
//! assert_eq!(rows, vec![0, 2]);
//!
//! // long queries only prove co-occurrence of n-grams; confirm each row
//! assert!(!index.is_index_only("fox"));
//! assert!(index.evaluate("foxhound", "FOX"));
//! ```
//!
//! Mutation is single-writer: callers serialize `add_row`/`remove_row`
//! against each other and against reads. Concurrent reads are safe.

pub mod error;
pub mod index;
pub mod query;
pub mod trie;
pub mod utils;

pub use error::{Error, Result};
pub use index::{
    ArrayPostingStore, Backend, Candidates, IndexConfig, IndexStats, NGramIndex, PostingStore,
    RowId, StoreStats, Term, TextIndex, TriePostingStore,
};
pub use query::IntSequence;
pub use trie::PrefixBitTrie;
