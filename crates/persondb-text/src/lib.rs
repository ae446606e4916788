//! persondb-text
//!
//! Tantivy-backed search index holding one document per person, keyed by
//! external reference. See `index` for writes and `search` for queries.
pub mod tantivy_utils;
pub mod index;
pub mod search;

pub use index::TantivyIndex;
