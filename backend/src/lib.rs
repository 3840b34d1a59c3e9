//! # csvclean - single-shot CSV normalizer and deduplicator
//!
//! Fetches one delimited-text object, drops structurally invalid and
//! repeated rows, and stores the canonical result next to a timestamped key.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ ObjectStore │────▶│   Parser    │────▶│ Normalizer  │────▶│   Dedup     │──▶ ObjectStore
//! │   (get)     │     │ (auto-enc)  │     │ (trim/drop) │     │ (first wins)│     (put)
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use csvclean::{Config, Handler, FsStore, ObjectLocation};
//!
//! #[tokio::main]
//! async fn main() {
//!     let handler = Handler::new(FsStore::new("/srv/objects"), Config::from_env().unwrap());
//!     let summary = handler.run(&ObjectLocation::new("raw", "sales.csv")).await.unwrap();
//!     println!("Wrote {} rows", summary.rows_processed);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Layered error types
//! - [`models`] - Raw and normalized records, canonical keys
//! - [`parser`] - CSV decoding, parsing and writing
//! - [`transform`] - Normalizer, deduplicator and cleaning pipeline
//! - [`storage`] - Object store boundary
//! - [`handler`] - Event in, response out
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP server and log stream

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Cleaning
pub mod transform;

// Boundary
pub mod config;
pub mod handler;
pub mod storage;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConfigError, CsvError, InvocationError, ServerError, StorageError, TransferError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{CanonicalKey, RawRecord, Record, RejectReason};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv,
    parse_csv_file_auto, write_csv, ParseResult,
};

// =============================================================================
// Re-exports - Cleaning
// =============================================================================

pub use transform::{
    clean_bytes, clean_csv_file, clean_parsed, clean_records, dedupe, normalize_record,
    CleanOutcome, CleanStats, CleanedDataset, Deduplicator, RejectedRow,
};

// =============================================================================
// Re-exports - Boundary
// =============================================================================

pub use config::Config;
pub use handler::{numbered_key, output_key, parse_event, Handler, InvocationResponse, InvocationSummary};
pub use storage::{FsStore, MemoryStore, ObjectLocation, ObjectStore};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, CleanResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
