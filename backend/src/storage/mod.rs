//! Object store boundary.
//!
//! The pipeline only ever talks to an [`ObjectStore`]. Stores are built by
//! the caller and passed in, never looked up from process-wide state.
//!
//! - [`MemoryStore`] - in-process map, for tests and dry runs
//! - [`FsStore`] - buckets as directories under a root

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

use crate::error::StorageResult;

/// Content type attached to cleaned output.
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// A bucket/key pair naming one object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Fetch and store whole objects.
///
/// `put` must be all-or-nothing: after a failed `put`, no object (partial
/// or otherwise) is visible at the location.
pub trait ObjectStore: Send + Sync {
    fn get(&self, location: &ObjectLocation) -> impl Future<Output = StorageResult<Vec<u8>>> + Send;

    /// Whether an object is present at the location.
    fn exists(&self, location: &ObjectLocation) -> impl Future<Output = StorageResult<bool>> + Send;

    fn put(
        &self,
        location: &ObjectLocation,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = StorageResult<()>> + Send;
}
