//! DocChat Search
//!
//! Keyword retrieval over a local document folder:
//! - Corpus loading with a per-document keyword index
//! - Relevance ranking by summed keyword frequency

pub mod corpus;
pub mod retrieval;
pub mod tokenizer;

pub use corpus::{Corpus, Document};
pub use retrieval::{best_match, rank, search, ScoredDocument};
