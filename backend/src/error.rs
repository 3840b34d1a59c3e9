//! Error types for the csvclean pipeline.
//!
//! Errors are layered the same way the pipeline is:
//!
//! - [`CsvError`] - decoding, parsing and writing delimited text
//! - [`StorageError`] - object store reads and writes
//! - [`ConfigError`] - missing or invalid environment settings
//! - [`InvocationError`] - fatal, per-invocation failures
//! - [`ServerError`] - HTTP surface errors
//!
//! Per-record rejections are not errors; they live in
//! [`crate::models::RejectReason`] and never abort a batch.

use thiserror::Error;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while turning bytes into records or records into bytes.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes could not be decoded as text.
    #[error("Failed to decode content as {encoding}: {message}")]
    Encoding { encoding: String, message: String },

    /// The underlying reader rejected the input.
    #[error("Invalid CSV format: {0}")]
    Malformed(#[from] csv::Error),

    /// Delimiter must be a single byte.
    #[error("Unsupported delimiter '{0}'")]
    InvalidDelimiter(char),

    /// Header row present but every name is blank.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// Two header names collide once trimmed.
    #[error("Duplicate header '{0}'")]
    DuplicateHeader(String),

    /// A data row carries more fields than the header declares.
    #[error("Line {line}: expected at most {expected} fields, found {found}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// Serializing the cleaned dataset failed.
    #[error("Failed to write CSV: {0}")]
    Write(String),
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors from an [`crate::storage::ObjectStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// No object at that location.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Bucket or key cannot be mapped onto the store.
    #[error("Invalid object location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },

    /// IO failure in a filesystem-backed store.
    #[error("Storage IO error at {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// Any other backend failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable not set (or blank).
    #[error("Missing {0} environment variable")]
    MissingVar(&'static str),
}

// =============================================================================
// Invocation Errors (top-level)
// =============================================================================

/// What went wrong on either side of the store boundary.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Csv(#[from] CsvError),
}

/// Fatal per-invocation failures.
///
/// Any of these aborts the invocation before an output object becomes
/// visible.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The trigger event does not describe exactly one input object.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// The source object could not be fetched or parsed.
    #[error("Failed to read {location}: {source}")]
    SourceRead {
        location: String,
        #[source]
        source: TransferError,
    },

    /// The cleaned output could not be serialized or stored.
    #[error("Failed to write {location}: {source}")]
    SinkWrite {
        location: String,
        #[source]
        source: TransferError,
    },
}

impl InvocationError {
    /// Taxonomy code reported to callers.
    pub fn code(&self) -> &'static str {
        match self {
            InvocationError::InvalidEvent(_) => "INVALID_EVENT",
            InvocationError::SourceRead { .. } => "SOURCE_READ_FAILURE",
            InvocationError::SinkWrite { .. } => "SINK_WRITE_FAILURE",
        }
    }

    /// HTTP-style status code for the invocation response.
    pub fn status_code(&self) -> u16 {
        match self {
            InvocationError::InvalidEvent(_) => 400,
            InvocationError::SourceRead { .. } | InvocationError::SinkWrite { .. } => 500,
        }
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Parsing the uploaded dataset failed.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Socket or runtime failure.
    #[error("Internal server error: {0}")]
    Internal(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for invocations.
pub type InvocationResult<T> = Result<T, InvocationError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
