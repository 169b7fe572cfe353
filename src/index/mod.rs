pub mod array_store;
pub mod ngram_index;
pub mod store;
pub mod trie_store;
pub mod types;

pub use array_store::ArrayPostingStore;
pub use ngram_index::{Candidates, NGramIndex};
pub use store::{PostingStore, StoreStats};
pub use trie_store::TriePostingStore;
pub use types::*;
