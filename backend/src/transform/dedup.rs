//! Dataset deduplicator: keeps the first occurrence of each distinct record.
//!
//! Equality is by content over all fields, independent of field order, via
//! [`CanonicalKey`]. Relative order of kept records is the input order.

use std::collections::HashSet;

use crate::models::{CanonicalKey, Record};

/// Incremental duplicate filter.
///
/// Holds the canonical keys seen so far; [`Deduplicator::admit`] answers
/// whether a record is the first of its kind.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<CanonicalKey>,
    removed: usize,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` the first time a record's content is seen, `false` after.
    pub fn admit(&mut self, record: &Record) -> bool {
        let fresh = self.seen.insert(record.canonical_key());
        if !fresh {
            self.removed += 1;
        }
        fresh
    }

    /// Number of records refused so far.
    pub fn removed(&self) -> usize {
        self.removed
    }

    /// Number of distinct records admitted so far.
    pub fn distinct(&self) -> usize {
        self.seen.len()
    }

    /// Filter a whole sequence, keeping first occurrences in order.
    pub fn filter(&mut self, records: Vec<Record>) -> Vec<Record> {
        records.into_iter().filter(|r| self.admit(r)).collect()
    }
}

/// Remove duplicates from `records`, keeping first occurrences in order.
pub fn dedupe(records: Vec<Record>) -> Vec<Record> {
    Deduplicator::new().filter(records)
}
