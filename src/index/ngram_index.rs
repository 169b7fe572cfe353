//! N-gram candidate engine.
//!
//! Rows are indexed with dense coverage (every overlapping n-gram). Queries
//! of at least `ngram_size` characters are cut into disjoint windows whose
//! posting lists are intersected; the result is a superset of the matching
//! rows and must be confirmed with [`NGramIndex::evaluate`]. Shorter queries
//! are answered exactly by collecting every stored term that contains the
//! query characters and taking the union of their postings.

use crate::error::{Error, Result};
use crate::index::array_store::ArrayPostingStore;
use crate::index::store::PostingStore;
use crate::index::trie_store::TriePostingStore;
use crate::index::types::{IndexStats, RowId, Term};
use crate::query::sequence::{EmptySequence, IntSequence, IntersectSequence, UnionSequence};
use crate::utils::{NGramCodec, normalize};
use memchr::memmem;
use rayon::prelude::*;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct NGramIndex<S> {
    codec: NGramCodec,
    store: S,
}

impl NGramIndex<ArrayPostingStore> {
    pub fn with_array_store(ngram_size: usize, bits_per_char: u32) -> Result<Self> {
        let codec = NGramCodec::new(ngram_size, bits_per_char)?;
        check_term_bits::<ArrayPostingStore>(&codec)?;
        Self::new(codec, ArrayPostingStore::new(codec.term_bits()))
    }
}

impl NGramIndex<TriePostingStore> {
    pub fn with_trie_store(
        ngram_size: usize,
        bits_per_char: u32,
        initial_pages: u32,
    ) -> Result<Self> {
        let codec = NGramCodec::new(ngram_size, bits_per_char)?;
        check_term_bits::<TriePostingStore>(&codec)?;
        Self::new(
            codec,
            TriePostingStore::new(codec.term_bits(), initial_pages)?,
        )
    }
}

fn check_term_bits<S: PostingStore>(codec: &NGramCodec) -> Result<()> {
    if codec.term_bits() > S::MAX_TERM_BITS {
        return Err(Error::config(format!(
            "term length {} bits is above {} bit limit",
            codec.term_bits(),
            S::MAX_TERM_BITS
        )));
    }
    Ok(())
}

impl<S: PostingStore> NGramIndex<S> {
    /// Wrap an empty store sized for `codec`'s terms.
    pub fn new(codec: NGramCodec, store: S) -> Result<Self> {
        check_term_bits::<S>(&codec)?;
        debug!(
            ngram_size = codec.ngram_size(),
            bits_per_char = codec.bits_per_char(),
            "created n-gram index"
        );
        Ok(Self { codec, store })
    }

    pub fn codec(&self) -> &NGramCodec {
        &self.codec
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// True when the candidate set for `query` is exact: the query is empty
    /// or shorter than one n-gram. Longer queries only prove that all their
    /// windows co-occur, so candidates need [`evaluate`](Self::evaluate).
    ///
    /// Exact only up to normalization: characters that mask to the same
    /// code collide, and a character that masks to zero also matches the
    /// padding of rows shorter than one n-gram.
    pub fn is_index_only(&self, query: &str) -> bool {
        query.chars().count() < self.codec.ngram_size()
    }

    /// Case-insensitive substring test, the ground truth for candidates.
    pub fn evaluate(&self, text: &str, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        if text.is_empty() {
            return false;
        }
        let text = text.to_lowercase();
        let query = query.to_lowercase();
        memmem::find(text.as_bytes(), query.as_bytes()).is_some()
    }

    /// Whether `row` belongs to the candidate set of `query`, without
    /// building the set.
    pub fn screen(&self, row: RowId, query: &str) -> Result<bool> {
        let chars = checked_query(query)?;
        if chars.len() < self.codec.ngram_size() {
            return Ok(self
                .matching_terms(&chars)
                .any(|term| self.store.contains(term, row)));
        }
        Ok(self
            .codec
            .query_terms(query)
            .into_iter()
            .all(|term| self.store.contains(term, row)))
    }

    /// Lazy ascending sequence of rows that may contain `query`.
    pub fn candidates(&self, query: &str) -> Result<Candidates<'_, S>> {
        let chars = checked_query(query)?;
        if chars.len() < self.codec.ngram_size() {
            let terms: Vec<Term> = self.matching_terms(&chars).collect();
            if terms.is_empty() {
                return Ok(Candidates::Empty(EmptySequence));
            }
            return Ok(Candidates::Union(UnionSequence::new(
                &self.store,
                self.codec,
                terms,
            )));
        }

        let mut terms = self.codec.query_terms(query);
        terms.sort_unstable();
        terms.dedup();
        Ok(Candidates::Intersect(IntersectSequence::new(
            &self.store,
            self.codec,
            terms,
        )))
    }

    pub fn add_row(&mut self, row: RowId, text: &str) -> Result<()> {
        check_row(row)?;
        let terms = self.codec.dense_terms(text);
        for &term in &terms {
            self.store.add(term, row)?;
        }
        trace!(row, terms = terms.len(), "added row");
        Ok(())
    }

    pub fn remove_row(&mut self, row: RowId, text: &str) -> Result<()> {
        check_row(row)?;
        let terms = self.codec.dense_terms(text);
        for &term in &terms {
            self.store.remove(term, row)?;
        }
        trace!(row, terms = terms.len(), "removed row");
        Ok(())
    }

    /// Index a batch of rows. Tokenization runs in parallel; postings are
    /// applied in input order.
    pub fn add_rows(&mut self, rows: &[(RowId, &str)]) -> Result<()> {
        for &(row, _) in rows {
            check_row(row)?;
        }
        let codec = self.codec;
        let tokenized: Vec<(RowId, Vec<Term>)> = rows
            .par_iter()
            .map(|&(row, text)| (row, codec.dense_terms(text)))
            .collect();

        let mut postings = 0usize;
        for (row, terms) in tokenized {
            postings += terms.len();
            for term in terms {
                self.store.add(term, row)?;
            }
        }
        debug!(rows = rows.len(), postings, "bulk loaded rows");
        Ok(())
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            ngram_size: self.codec.ngram_size(),
            bits_per_char: self.codec.bits_per_char(),
            terms: self.stored_terms().count() as u64,
            store: self.store.stats(),
        }
    }

    /// Every stored term, ascending
    fn stored_terms(&self) -> impl Iterator<Item = Term> + '_ {
        let mut next = Some(0);
        std::iter::from_fn(move || {
            let term = self.store.seek_term(next?)?;
            next = term.checked_add(1);
            Some(term)
        })
    }

    /// Stored terms containing the short query `chars` as a sub-field
    fn matching_terms<'a>(&'a self, chars: &[u8]) -> impl Iterator<Item = Term> + 'a {
        let sub = self.codec.subterm(chars);
        let len = chars.len();
        self.stored_terms()
            .filter(move |&term| self.codec.contains(term, sub, len))
    }
}

fn check_row(row: RowId) -> Result<()> {
    if row < 0 {
        return Err(Error::argument(format!("row id {} is negative", row)));
    }
    Ok(())
}

fn checked_query(query: &str) -> Result<Vec<u8>> {
    if query.is_empty() {
        return Err(Error::argument("query is empty"));
    }
    Ok(normalize(query))
}

/// Candidate rows for one query.
#[derive(Debug)]
pub enum Candidates<'a, S> {
    Empty(EmptySequence),
    Intersect(IntersectSequence<'a, S>),
    Union(UnionSequence<'a, S>),
}

impl<S: PostingStore> IntSequence for Candidates<'_, S> {
    fn is_valid(&self) -> bool {
        match self {
            Candidates::Empty(seq) => seq.is_valid(),
            Candidates::Intersect(seq) => seq.is_valid(),
            Candidates::Union(seq) => seq.is_valid(),
        }
    }

    fn advance(&mut self) -> bool {
        match self {
            Candidates::Empty(seq) => seq.advance(),
            Candidates::Intersect(seq) => seq.advance(),
            Candidates::Union(seq) => seq.advance(),
        }
    }

    fn value(&self) -> RowId {
        match self {
            Candidates::Empty(seq) => seq.value(),
            Candidates::Intersect(seq) => seq.value(),
            Candidates::Union(seq) => seq.value(),
        }
    }
}
