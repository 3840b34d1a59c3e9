use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::{ObjectLocation, ObjectStore};
use crate::error::{StorageError, StorageResult};

/// Buckets are directories under `root`; keys are relative paths inside
/// them.
///
/// Writes go to a uniquely named temporary file beside the target and are
/// renamed into place, so readers never observe a half-written object.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a location onto a path, refusing anything that would escape its
    /// bucket directory.
    pub fn path_for(&self, location: &ObjectLocation) -> StorageResult<PathBuf> {
        let invalid = |reason: &str| StorageError::InvalidLocation {
            location: location.to_string(),
            reason: reason.to_string(),
        };

        if location.bucket.contains('/') || !is_plain_relative(&location.bucket) {
            return Err(invalid("bucket must be a single path component"));
        }
        if !is_plain_relative(&location.key) {
            return Err(invalid("key must be a relative file path without '.' or '..' segments"));
        }

        Ok(self.root.join(&location.bucket).join(&location.key))
    }
}

/// Non-empty `/`-separated segments, none of them `.` or `..`.
fn is_plain_relative(path: &str) -> bool {
    !path.is_empty()
        && path
            .split('/')
            .all(|seg| !seg.is_empty() && seg != "." && seg != ".." && !seg.contains('\\'))
}

impl ObjectStore for FsStore {
    async fn get(&self, location: &ObjectLocation) -> StorageResult<Vec<u8>> {
        let path = self.path_for(location)?;
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(location.to_string()),
            _ => StorageError::Io {
                location: location.to_string(),
                source: e,
            },
        })
    }

    async fn exists(&self, location: &ObjectLocation) -> StorageResult<bool> {
        let path = self.path_for(location)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io {
                location: location.to_string(),
                source: e,
            }),
        }
    }

    async fn put(&self, location: &ObjectLocation, bytes: Vec<u8>, _content_type: &str) -> StorageResult<()> {
        let path = self.path_for(location)?;
        let io_err = |source: std::io::Error| StorageError::Io {
            location: location.to_string(),
            source,
        };

        let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
            return Err(StorageError::InvalidLocation {
                location: location.to_string(),
                reason: "key must name a file".to_string(),
            });
        };
        tokio::fs::create_dir_all(dir).await.map_err(io_err)?;

        let tmp = dir.join(format!(".{}.{}.tmp", name.to_string_lossy(), Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_err(e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_err(e));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_then_get_nested_key() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let loc = ObjectLocation::new("out", "processed/20240101_000000_a.csv");

        store.put(&loc, b"a\n1\n".to_vec(), "text/csv").await.unwrap();

        assert_eq!(store.get(&loc).await.unwrap(), b"a\n1\n");
        let written = dir.path().join("out/processed/20240101_000000_a.csv");
        assert!(written.is_file());
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let loc = ObjectLocation::new("out", "a.csv");

        store.put(&loc, b"x".to_vec(), "text/csv").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path().join("out"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.csv"]);
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let err = store.get(&ObjectLocation::new("in", "a.csv")).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_exists() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let loc = ObjectLocation::new("out", "processed/a.csv");

        assert!(!store.exists(&loc).await.unwrap());
        store.put(&loc, b"a\n".to_vec(), "text/csv").await.unwrap();
        assert!(store.exists(&loc).await.unwrap());
        // a directory is not an object
        assert!(!store.exists(&ObjectLocation::new("out", "processed")).await.unwrap());
    }

    #[test]
    fn test_rejects_escaping_locations() {
        let store = FsStore::new("/srv/objects");
        for (bucket, key) in [
            ("in", "../secret.csv"),
            ("in", "/etc/passwd"),
            ("in", "a/./b.csv"),
            ("..", "a.csv"),
            ("a/b", "c.csv"),
            ("", "a.csv"),
            ("in", ""),
            ("in", "dir/"),
        ] {
            let loc = ObjectLocation::new(bucket, key);
            assert!(
                matches!(store.path_for(&loc), Err(StorageError::InvalidLocation { .. })),
                "{} should be rejected",
                loc
            );
        }
    }

    #[test]
    fn test_path_for_joins_bucket_and_key() {
        let store = FsStore::new("/srv/objects");
        let path = store.path_for(&ObjectLocation::new("in", "2024/a.csv")).unwrap();
        assert_eq!(path, PathBuf::from("/srv/objects/in/2024/a.csv"));
    }
}
