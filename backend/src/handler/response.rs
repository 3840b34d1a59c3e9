//! Structured invocation result.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::InvocationError;
use crate::storage::ObjectLocation;
use crate::transform::CleanStats;

/// What a successful invocation did.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationSummary {
    pub input: ObjectLocation,
    /// `None` when nothing survived cleaning and no write happened
    pub output: Option<ObjectLocation>,
    pub rows_processed: usize,
    pub stats: CleanStats,
}

/// HTTP-style status plus a JSON body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: Value,
}

impl InvocationResponse {
    pub fn success(summary: &InvocationSummary) -> Self {
        let message = if summary.output.is_some() {
            "CSV processed successfully"
        } else {
            "No rows survived cleaning; nothing written"
        };

        Self {
            status_code: 200,
            body: json!({
                "message": message,
                "input_file": summary.input.to_string(),
                "output_file": summary.output.as_ref().map(ToString::to_string),
                "rows_processed": summary.rows_processed,
                "stats": summary.stats,
            }),
        }
    }

    pub fn failure(err: &InvocationError) -> Self {
        Self {
            status_code: err.status_code(),
            body: json!({
                "error": err.to_string(),
                "code": err.code(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
