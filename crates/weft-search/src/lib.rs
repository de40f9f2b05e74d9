//! Full-text and vector search engines for Weft.
//!
//! # Modules
//!
//! - [`fulltext`]: bm25-ranked FTS5 search over a collection's shadow index
//! - [`vector`]: brute-force linear-scan similarity search
//!
//! Both engines compile the caller's filter spec through
//! `weft_storage::filter`, so tag and metadata filters behave identically
//! regardless of search strategy. Result ranks are 1-based and assigned
//! after final ordering and truncation.

#![doc = include_str!("../README.md")]

pub mod fulltext;
pub mod vector;

pub use fulltext::FullTextSearch;
pub use vector::VectorSearch;

/// Result limit applied when the caller passes zero.
pub const DEFAULT_LIMIT: usize = 10;
