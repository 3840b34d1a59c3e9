//! Cleaning module.
//!
//! - Normalizer: trims one row and applies the missing-value policy
//! - Dedup: drops repeated rows, keeping first occurrences
//! - Pipeline: runs both over a dataset and counts what happened

pub mod dedup;
pub mod normalizer;
pub mod pipeline;

pub use dedup::{dedupe, Deduplicator};
pub use normalizer::normalize_record;
pub use pipeline::*;
