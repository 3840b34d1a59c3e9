//! Runtime configuration.
//!
//! The only external setting is the destination bucket for cleaned output,
//! read from `OUTPUT_BUCKET`. The binary loads `.env` once at startup; this
//! module only reads the process environment.

use std::env;

use crate::error::ConfigError;

/// Environment variable naming the output bucket.
pub const OUTPUT_BUCKET_VAR: &str = "OUTPUT_BUCKET";

/// Key prefix under which cleaned datasets are stored.
pub const OUTPUT_PREFIX: &str = "processed";

/// Largest CSV accepted by the upload endpoint, in bytes.
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Bucket that receives cleaned output
    pub output_bucket: String,
}

impl Config {
    pub fn new(output_bucket: impl Into<String>) -> Self {
        Self {
            output_bucket: output_bucket.into(),
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bucket = lookup(OUTPUT_BUCKET_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingVar(OUTPUT_BUCKET_VAR))?;

        Ok(Self::new(bucket))
    }
}
