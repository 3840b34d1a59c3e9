//! Invocation handler: one event in, one structured response out.
//!
//! ```text
//! event ──▶ input location ──▶ store.get ──▶ clean ──▶ store.put ──▶ response
//! ```
//!
//! Per-row rejections are counted and never fail an invocation. Failing to
//! read the source or to store the output does, and in both cases nothing
//! is left at the output location.

pub mod event;
pub mod response;

pub use event::{event_for, parse_event, StorageEvent};
pub use response::{InvocationResponse, InvocationSummary};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::api::logs::{log_error, log_info, log_success, log_warning};
use crate::config::{Config, OUTPUT_PREFIX};
use crate::error::{InvocationError, InvocationResult, StorageResult, TransferError};
use crate::storage::{ObjectLocation, ObjectStore, CSV_CONTENT_TYPE};
use crate::transform::clean_bytes;

/// Source of "now" for output key timestamps.
pub type Clock = fn() -> DateTime<Utc>;

/// Output key for an input key: `processed/{YYYYMMDD_HHMMSS}_{file name}`.
pub fn output_key(input_key: &str, at: DateTime<Utc>) -> String {
    let file_name = input_key.rsplit('/').next().unwrap_or(input_key);
    format!("{}/{}_{}", OUTPUT_PREFIX, at.format("%Y%m%d_%H%M%S"), file_name)
}

/// `key` with `_{n}` inserted before the file extension.
///
/// `processed/20240309_140507_people.csv` becomes
/// `processed/20240309_140507_people_2.csv`.
pub fn numbered_key(key: &str, n: u32) -> String {
    let name_start = key.rfind('/').map_or(0, |i| i + 1);
    match key[name_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let (stem, ext) = key.split_at(name_start + dot);
            format!("{}_{}{}", stem, n, ext)
        }
        _ => format!("{}_{}", key, n),
    }
}

/// Runs invocations against an injected store.
pub struct Handler<S> {
    store: S,
    config: Config,
    clock: Clock,
}

impl<S: ObjectStore> Handler<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self {
            store,
            config,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock, e.g. for reproducible output keys.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle a raw event, turning every outcome into a response.
    pub async fn handle_event(&self, event: &Value) -> InvocationResponse {
        let result = match parse_event(event) {
            Ok(input) => self.run(&input).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(summary) => InvocationResponse::success(&summary),
            Err(e) => {
                log_error(format!("{}: {}", e.code(), e));
                InvocationResponse::failure(&e)
            }
        }
    }

    /// Fetch, clean and store one object.
    pub async fn run(&self, input: &ObjectLocation) -> InvocationResult<InvocationSummary> {
        log_info(format!("📄 Processing file: {}", input));

        let source_err = |source: TransferError| InvocationError::SourceRead {
            location: input.to_string(),
            source,
        };

        let bytes = self
            .store
            .get(input)
            .await
            .map_err(|e| source_err(e.into()))?;
        log_success(format!("Fetched {} bytes", bytes.len()));

        let cleaned = clean_bytes(&bytes).map_err(|e| source_err(e.into()))?;

        if cleaned.is_empty() {
            log_warning("No data to write");
            return Ok(InvocationSummary {
                input: input.clone(),
                output: None,
                rows_processed: 0,
                stats: cleaned.stats,
            });
        }

        let preferred = ObjectLocation::new(
            self.config.output_bucket.clone(),
            output_key(&input.key, (self.clock)()),
        );
        let output = self
            .unused_location(&preferred)
            .await
            .map_err(|e| InvocationError::SinkWrite {
                location: preferred.to_string(),
                source: e.into(),
            })?;
        let sink_err = |source: TransferError| InvocationError::SinkWrite {
            location: output.to_string(),
            source,
        };

        let body = cleaned.to_csv().map_err(|e| sink_err(e.into()))?;
        self.store
            .put(&output, body, CSV_CONTENT_TYPE)
            .await
            .map_err(|e| sink_err(e.into()))?;

        log_success(format!("Wrote {} rows to {}", cleaned.records.len(), output));

        Ok(InvocationSummary {
            input: input.clone(),
            output: Some(output),
            rows_processed: cleaned.records.len(),
            stats: cleaned.stats,
        })
    }

    /// `preferred`, or the first numbered variant of it nothing occupies yet.
    async fn unused_location(&self, preferred: &ObjectLocation) -> StorageResult<ObjectLocation> {
        let mut candidate = preferred.clone();
        let mut n = 1;
        while self.store.exists(&candidate).await? {
            n += 1;
            candidate.key = numbered_key(&preferred.key, n);
        }
        if n > 1 {
            log_warning(format!("{} already exists, writing {}", preferred, candidate));
        }
        Ok(candidate)
    }
}
