//! Utility functions and data structures.
//!
//! ## Modules
//!
//! - [`ngram`] - Character normalization and n-gram term packing
//!
//! ## Key Functions
//!
//! ```
//! use fastngram::utils::NGramCodec;
//!
//! let codec = NGramCodec::new(3, 6).unwrap();
//!
//! // Overlapping terms for indexed text
//! let terms = codec.dense_terms("hello world");
//! assert_eq!(terms.len(), 9);
//!
//! // Disjoint windows for queries: "hel", "lo ", "wor", "rld"
//! assert_eq!(codec.query_terms("hello world").len(), 4);
//! ```

pub mod ngram;

pub use ngram::*;
