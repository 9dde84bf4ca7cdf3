//! The search engines behind the adapters.
//!
//! - [`FuzzyIndex`](crate::searchers::FuzzyIndex): approximate matching of the
//!   whole query against each field value. Good for short, typo-prone
//!   lookups.
//! - [`InvertedIndex`](crate::searchers::InvertedIndex): tokenized term
//!   lookup with BM25+ ranking, prefix and fuzzy term expansion.

/// Implements the BM25+ relevance scoring function.
pub mod bm25;
/// Implements a score-threshold fuzzy matcher.
pub mod fuzzy;
/// Implements a tokenizing inverted index.
pub mod inverted;
/// Provides text tokenization utilities for searchers.
pub mod tokenizer;

pub use fuzzy::FuzzyIndex;
pub use inverted::{IndexHit, InvertedIndex};
