use crate::error::Result;
use crate::index::types::{RowId, Term};
use serde::{Deserialize, Serialize};

/// Posting storage the n-gram engine runs against.
///
/// A store maps each term to a strictly ascending, duplicate-free list of
/// rows. Row arguments are always non-negative.
pub trait PostingStore {
    /// Widest term, in bits, this store can address
    const MAX_TERM_BITS: u32;

    /// Smallest stored term at or above `term`
    fn seek_term(&self, term: Term) -> Option<Term>;

    /// Smallest row at or above `row` stored under `term`
    fn seek_term_row(&self, term: Term, row: RowId) -> Option<RowId>;

    fn contains(&self, term: Term, row: RowId) -> bool;

    /// Insert a posting; adding an existing one is a no-op
    fn add(&mut self, term: Term, row: RowId) -> Result<()>;

    /// Delete a posting; removing an absent one is a no-op
    fn remove(&mut self, term: Term, row: RowId) -> Result<()>;

    fn stats(&self) -> StoreStats;
}

/// Backend size figures
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub backend: String,
    pub postings: u64,
    pub memory_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots_used: Option<u64>,
}
