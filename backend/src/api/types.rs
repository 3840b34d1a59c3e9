//! REST API types.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::CsvError;
use crate::transform::{CleanStats, CleanedDataset};

/// Response to a CSV upload: the cleaned CSV plus what was dropped and why.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanResponse {
    pub job_id: String,

    /// "ready" (nothing rejected), "warning" (some rows rejected) or
    /// "empty" (no rows survived)
    pub status: String,

    /// Cleaned dataset as CSV text
    pub csv: String,

    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub csv_info: CsvMetadata,
    pub stats: CleanStats,
    pub rejected: Vec<RejectedRowInfo>,
}

/// Source file metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRowInfo {
    pub row: usize,
    pub reason: String,
}

impl TryFrom<CleanedDataset> for CleanResponse {
    type Error = CsvError;

    fn try_from(cleaned: CleanedDataset) -> Result<Self, Self::Error> {
        let csv = if cleaned.is_empty() {
            String::new()
        } else {
            let bytes = cleaned.to_csv()?;
            String::from_utf8(bytes).map_err(|e| CsvError::Write(e.to_string()))?
        };

        let status = if cleaned.is_empty() {
            "empty"
        } else if cleaned.stats.rejected_total() > 0 {
            "warning"
        } else {
            "ready"
        };

        Ok(CleanResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            csv,
            metadata: ResponseMetadata {
                csv_info: CsvMetadata {
                    encoding: cleaned.encoding,
                    delimiter: cleaned.delimiter.to_string(),
                    row_count: cleaned.stats.rows_read,
                    columns: cleaned.headers,
                },
                rejected: cleaned
                    .rejected_rows
                    .iter()
                    .map(|r| RejectedRowInfo {
                        row: r.row,
                        reason: r.reason.to_string(),
                    })
                    .collect(),
                stats: cleaned.stats,
            },
        })
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "csv": "",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::clean_bytes;

    #[test]
    fn test_warning_status_lists_rejections() {
        let cleaned = clean_bytes(b"name,age\nAlice,30\nBob,\n").unwrap();
        let response = CleanResponse::try_from(cleaned).unwrap();

        assert_eq!(response.status, "warning");
        assert_eq!(response.csv, "name,age\nAlice,30\n");
        assert_eq!(response.metadata.csv_info.row_count, 2);
        assert_eq!(response.metadata.rejected.len(), 1);
        assert_eq!(response.metadata.rejected[0].row, 2);
        assert_eq!(response.metadata.rejected[0].reason, "MISSING_REQUIRED_FIELD (age)");
    }

    #[test]
    fn test_empty_status() {
        let cleaned = clean_bytes(b"name,age\n,\n").unwrap();
        let response = CleanResponse::try_from(cleaned).unwrap();
        assert_eq!(response.status, "empty");
        assert!(response.csv.is_empty());
    }

    #[test]
    fn test_response_json_is_camel_case() {
        let cleaned = clean_bytes(b"a\n1\n").unwrap();
        let json = serde_json::to_value(CleanResponse::try_from(cleaned).unwrap()).unwrap();
        assert_eq!(json["status"], "ready");
        assert!(json.get("jobId").is_some());
        assert_eq!(json["metadata"]["csvInfo"]["columns"][0], "a");
    }

    #[test]
    fn test_error_response_shape() {
        let body = error_response("boom");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "boom");
    }
}
