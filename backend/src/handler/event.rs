//! Storage notification envelope.
//!
//! Only the fields needed to locate the input object are modelled; every
//! other part of the notification is ignored.
//!
//! ```json
//! { "Records": [ { "s3": { "bucket": { "name": "raw" }, "object": { "key": "in/a.csv" } } } ] }
//! ```

use serde::Deserialize;
use serde_json::Value;

use crate::error::{InvocationError, InvocationResult};
use crate::storage::ObjectLocation;

#[derive(Debug, Deserialize)]
pub struct StorageEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<EventRecord>,
}

#[derive(Debug, Deserialize)]
pub struct EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Deserialize)]
pub struct S3Entity {
    pub bucket: BucketRef,
    pub object: ObjectRef,
}

#[derive(Debug, Deserialize)]
pub struct BucketRef {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ObjectRef {
    pub key: String,
}

/// Extract the single input location an event describes.
pub fn parse_event(event: &Value) -> InvocationResult<ObjectLocation> {
    let event = StorageEvent::deserialize(event)
        .map_err(|e| InvocationError::InvalidEvent(e.to_string()))?;

    let record = match event.records.as_slice() {
        [record] => record,
        [] => return Err(InvocationError::InvalidEvent("event contains no records".into())),
        many => {
            return Err(InvocationError::InvalidEvent(format!(
                "expected exactly one record, found {}",
                many.len()
            )))
        }
    };

    let bucket = record.s3.bucket.name.trim();
    let key = record.s3.object.key.trim();
    if bucket.is_empty() || key.is_empty() {
        return Err(InvocationError::InvalidEvent("bucket name and object key are required".into()));
    }

    Ok(ObjectLocation::new(bucket, key))
}

/// Build the envelope for one object.
pub fn event_for(location: &ObjectLocation) -> Value {
    serde_json::json!({
        "Records": [{
            "s3": {
                "bucket": { "name": location.bucket },
                "object": { "key": location.key }
            }
        }]
    })
}
