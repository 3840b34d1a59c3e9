use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{ObjectLocation, ObjectStore};
use crate::error::{StorageError, StorageResult};

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// Objects held in a map, with switchable failures for exercising error
/// paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<ObjectLocation, StoredObject>>,
    fail_gets: AtomicBool,
    fail_puts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object.
    pub fn insert(&self, location: ObjectLocation, bytes: impl Into<Vec<u8>>) {
        self.lock().insert(
            location,
            StoredObject {
                bytes: bytes.into(),
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    /// Make every subsequent `get` fail with a backend error.
    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `put` fail with a backend error.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn object(&self, location: &ObjectLocation) -> Option<Vec<u8>> {
        self.lock().get(location).map(|o| o.bytes.clone())
    }

    pub fn content_type(&self, location: &ObjectLocation) -> Option<String> {
        self.lock().get(location).map(|o| o.content_type.clone())
    }

    /// All locations in `bucket`, sorted by key.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lock()
            .keys()
            .filter(|loc| loc.bucket == bucket)
            .map(|loc| loc.key.clone())
            .collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ObjectLocation, StoredObject>> {
        // the map holds plain data, a panic mid-insert leaves it consistent
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ObjectStore for MemoryStore {
    async fn get(&self, location: &ObjectLocation) -> StorageResult<Vec<u8>> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(format!("get {} refused", location)));
        }
        self.object(location)
            .ok_or_else(|| StorageError::NotFound(location.to_string()))
    }

    async fn exists(&self, location: &ObjectLocation) -> StorageResult<bool> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(format!("head {} refused", location)));
        }
        Ok(self.lock().contains_key(location))
    }

    async fn put(&self, location: &ObjectLocation, bytes: Vec<u8>, content_type: &str) -> StorageResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::Backend(format!("put {} refused", location)));
        }
        self.lock().insert(
            location.clone(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryStore::new();
        let loc = ObjectLocation::new("out", "a.csv");

        store.put(&loc, b"a\n1\n".to_vec(), "text/csv").await.unwrap();

        assert_eq!(store.get(&loc).await.unwrap(), b"a\n1\n");
        assert_eq!(store.content_type(&loc).as_deref(), Some("text/csv"));
        assert_eq!(store.keys("out"), vec!["a.csv"]);
    }

    #[tokio::test]
    async fn test_missing_object() {
        let store = MemoryStore::new();
        let err = store.get(&ObjectLocation::new("in", "nope.csv")).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_exists() {
        let store = MemoryStore::new();
        let loc = ObjectLocation::new("out", "a.csv");
        assert!(!store.exists(&loc).await.unwrap());
        store.insert(loc.clone(), "a\n");
        assert!(store.exists(&loc).await.unwrap());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryStore::new();
        let loc = ObjectLocation::new("in", "a.csv");
        store.insert(loc.clone(), "a\n1\n");

        store.fail_gets(true);
        assert!(matches!(store.get(&loc).await, Err(StorageError::Backend(_))));

        store.fail_puts(true);
        let out = ObjectLocation::new("out", "a.csv");
        assert!(store.put(&out, Vec::new(), "text/csv").await.is_err());
        assert!(store.object(&out).is_none());
    }
}
