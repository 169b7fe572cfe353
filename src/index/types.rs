use crate::error::{Error, Result};
use crate::index::array_store::ArrayPostingStore;
use crate::index::ngram_index::NGramIndex;
use crate::index::store::{PostingStore, StoreStats};
use crate::index::trie_store::TriePostingStore;
use crate::query::sequence::IntSequence;
use crate::utils::NGramCodec;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

/// Caller-supplied row handle; only non-negative values are accepted
pub type RowId = i32;

/// A packed n-gram (at most 30 bits used)
pub type Term = u32;

/// Posting store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backend {
    /// Direct-addressed posting lists, term space up to 24 bits
    Array,
    /// Bit-packed radix trie, term space up to 30 bits
    Trie { initial_pages: u32 },
}

impl Backend {
    pub const DEFAULT_INITIAL_PAGES: u32 = 4;
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Trie {
            initial_pages: Self::DEFAULT_INITIAL_PAGES,
        }
    }
}

/// Shape of an index
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub ngram_size: usize,
    pub bits_per_char: u32,
    pub backend: Backend,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            ngram_size: 3,
            bits_per_char: 6,
            backend: Backend::default(),
        }
    }
}

impl IndexConfig {
    /// Check every construction invariant without allocating the index.
    pub fn validate(&self) -> Result<()> {
        let codec = NGramCodec::new(self.ngram_size, self.bits_per_char)?;
        let limit = match self.backend {
            Backend::Array => ArrayPostingStore::MAX_TERM_BITS,
            Backend::Trie { initial_pages } => {
                if !(1..=crate::trie::MAX_PAGES).contains(&initial_pages) {
                    return Err(Error::config(format!(
                        "initial_pages ({}) out of [1, {}] range",
                        initial_pages,
                        crate::trie::MAX_PAGES
                    )));
                }
                TriePostingStore::MAX_TERM_BITS
            }
        };
        if codec.term_bits() > limit {
            return Err(Error::config(format!(
                "term length {} bits is above {} bit limit",
                codec.term_bits(),
                limit
            )));
        }
        Ok(())
    }

    pub fn build(&self) -> Result<TextIndex> {
        self.validate()?;
        Ok(match self.backend {
            Backend::Array => {
                TextIndex::Array(NGramIndex::with_array_store(self.ngram_size, self.bits_per_char)?)
            }
            Backend::Trie { initial_pages } => TextIndex::Trie(NGramIndex::with_trie_store(
                self.ngram_size,
                self.bits_per_char,
                initial_pages,
            )?),
        })
    }
}

/// Index with its backend chosen at runtime
#[derive(Debug)]
pub enum TextIndex {
    Array(NGramIndex<ArrayPostingStore>),
    Trie(NGramIndex<TriePostingStore>),
}

macro_rules! dispatch {
    ($self:expr, $idx:ident => $body:expr) => {
        match $self {
            TextIndex::Array($idx) => $body,
            TextIndex::Trie($idx) => $body,
        }
    };
}

impl TextIndex {
    pub fn is_index_only(&self, query: &str) -> bool {
        dispatch!(self, idx => idx.is_index_only(query))
    }

    pub fn evaluate(&self, text: &str, query: &str) -> bool {
        dispatch!(self, idx => idx.evaluate(text, query))
    }

    pub fn screen(&self, row: RowId, query: &str) -> Result<bool> {
        dispatch!(self, idx => idx.screen(row, query))
    }

    pub fn candidates(&self, query: &str) -> Result<Box<dyn IntSequence + '_>> {
        dispatch!(self, idx => {
            let seq: Box<dyn IntSequence + '_> = Box::new(idx.candidates(query)?);
            Ok(seq)
        })
    }

    /// Materialize the candidate set
    pub fn candidate_bitmap(&self, query: &str) -> Result<RoaringBitmap> {
        dispatch!(self, idx => Ok(idx.candidates(query)?.to_bitmap()))
    }

    pub fn add_row(&mut self, row: RowId, text: &str) -> Result<()> {
        dispatch!(self, idx => idx.add_row(row, text))
    }

    pub fn remove_row(&mut self, row: RowId, text: &str) -> Result<()> {
        dispatch!(self, idx => idx.remove_row(row, text))
    }

    pub fn add_rows(&mut self, rows: &[(RowId, &str)]) -> Result<()> {
        dispatch!(self, idx => idx.add_rows(rows))
    }

    pub fn stats(&self) -> IndexStats {
        dispatch!(self, idx => idx.stats())
    }
}

/// Size figures for an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub ngram_size: usize,
    pub bits_per_char: u32,
    /// Distinct terms with at least one posting
    pub terms: u64,
    #[serde(flatten)]
    pub store: StoreStats,
}
