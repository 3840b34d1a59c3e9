//! High-level cleaning API: normalize every row, drop rejects, deduplicate.
//!
//! # Example
//!
//! ```rust,ignore
//! use csvclean::transform::clean_bytes;
//!
//! let cleaned = clean_bytes(b"name,age\nAlice,30\nAlice,30\nBob,\n")?;
//! assert_eq!(cleaned.records.len(), 1);
//! assert_eq!(cleaned.stats.rejected["MISSING_REQUIRED_FIELD"], 1);
//! ```

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::dedup::Deduplicator;
use super::normalizer::normalize_record;
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning, log_warning_indent};
use crate::error::CsvResult;
use crate::models::{RawRecord, Record, RejectReason};
use crate::parser::{parse_bytes_auto, parse_csv_file_auto, write_csv, ParseResult};

/// Counters for one cleaning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanStats {
    /// Data rows read from the source
    pub rows_read: usize,
    /// Rejected rows per reason code
    pub rejected: BTreeMap<String, usize>,
    /// Normalized rows dropped as duplicates
    pub duplicates_removed: usize,
    /// Rows in the final output
    pub rows_output: usize,
}

impl CleanStats {
    /// Total rows dropped by the normalizer.
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    fn count_reject(&mut self, reason: &RejectReason) {
        *self.rejected.entry(reason.code().to_string()).or_default() += 1;
    }
}

/// A row the normalizer refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// 1-based data row number (the header is not counted)
    pub row: usize,
    pub reason: RejectReason,
}

/// Result of [`clean_records`].
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    /// Canonical, deduplicated records in input order
    pub records: Vec<Record>,
    /// Per-row rejections in input order
    pub rejected_rows: Vec<RejectedRow>,
    pub stats: CleanStats,
}

/// Run the normalizer over every row, then deduplicate the survivors.
///
/// Rejections never abort the batch. When nothing survives normalization
/// the deduplicator is skipped and an empty outcome is returned.
pub fn clean_records(raw: Vec<RawRecord>) -> CleanOutcome {
    let mut stats = CleanStats {
        rows_read: raw.len(),
        ..CleanStats::default()
    };
    let mut rejected_rows = Vec::new();
    let mut accepted = Vec::with_capacity(raw.len());

    for (idx, row) in raw.iter().enumerate() {
        match normalize_record(row) {
            Ok(record) => accepted.push(record),
            Err(reason) => {
                stats.count_reject(&reason);
                rejected_rows.push(RejectedRow { row: idx + 1, reason });
            }
        }
    }

    if accepted.is_empty() {
        return CleanOutcome {
            records: accepted,
            rejected_rows,
            stats,
        };
    }

    let mut dedup = Deduplicator::new();
    let records = dedup.filter(accepted);
    stats.duplicates_removed = dedup.removed();
    stats.rows_output = records.len();

    CleanOutcome {
        records,
        rejected_rows,
        stats,
    }
}

/// A cleaned dataset ready to serialize.
#[derive(Debug, Clone)]
pub struct CleanedDataset {
    /// Output column order: trimmed header names
    pub headers: Vec<String>,
    pub records: Vec<Record>,
    pub rejected_rows: Vec<RejectedRow>,
    pub stats: CleanStats,
    /// Source encoding as detected
    pub encoding: String,
    /// Source delimiter as detected
    pub delimiter: char,
}

impl CleanedDataset {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Header row plus one line per record.
    pub fn to_csv(&self) -> CsvResult<Vec<u8>> {
        write_csv(&self.headers, &self.records)
    }
}

/// Clean an already-parsed source.
pub fn clean_parsed(parsed: ParseResult) -> CleanedDataset {
    log_success(format!("Detected encoding: {}", parsed.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(parsed.delimiter)));
    log_success(format!("Read {} rows, {} columns", parsed.records.len(), parsed.headers.len()));

    let headers = parsed.headers.iter().map(|h| h.trim().to_string()).collect();

    log_info("🧹 Normalizing and deduplicating...");
    let outcome = clean_records(parsed.records);
    print_outcome(&outcome);

    CleanedDataset {
        headers,
        records: outcome.records,
        rejected_rows: outcome.rejected_rows,
        stats: outcome.stats,
        encoding: parsed.encoding,
        delimiter: parsed.delimiter,
    }
}

/// Decode, parse and clean raw CSV bytes.
pub fn clean_bytes(bytes: &[u8]) -> CsvResult<CleanedDataset> {
    log_info("📖 Reading CSV...");
    let parsed = parse_bytes_auto(bytes)?;
    Ok(clean_parsed(parsed))
}

/// Same as [`clean_bytes`] for a local file.
pub fn clean_csv_file(path: &Path) -> CsvResult<CleanedDataset> {
    log_info(format!("📖 Reading {}...", path.display()));
    let parsed = parse_csv_file_auto(path)?;
    Ok(clean_parsed(parsed))
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

fn print_outcome(outcome: &CleanOutcome) {
    let stats = &outcome.stats;

    if stats.rejected_total() > 0 {
        log_warning(format!("{} rows rejected", stats.rejected_total()));

        let mut by_reason: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for rejected in &outcome.rejected_rows {
            by_reason
                .entry(rejected.reason.code())
                .or_default()
                .push(rejected.row);
        }
        for (reason, rows) in &by_reason {
            let sample: Vec<String> = rows.iter().take(5).map(|r| r.to_string()).collect();
            let more = if rows.len() > 5 {
                format!("... +{}", rows.len() - 5)
            } else {
                String::new()
            };
            log_warning_indent(format!("• {} (rows: {}{})", reason, sample.join(", "), more), 1);
        }
    }

    if stats.duplicates_removed > 0 {
        log_info_indent(format!("{} duplicate rows removed", stats.duplicates_removed), 1);
    }

    if outcome.records.is_empty() {
        log_warning("No rows survived cleaning");
    } else {
        log_success(format!(
            "Cleaned data: {} input rows → {} output rows",
            stats.rows_read, stats.rows_output
        ));
    }
}
