//! Object storage abstraction.
//!
//! The [`ObjectStore`] trait hides where compressed log objects live. The
//! pipeline only needs a blocking byte reader per object; decompression and
//! line splitting happen in [`stream`](crate::stream).
//!
//! [`LocalObjectStore`] maps a bucket to a sub-directory of a configured root
//! and a key to a relative path inside it:
//!
//! ```text
//! <root>/<bucket>/<key>
//! ```
//!
//! # Path validation
//!
//! Buckets and keys come from queue messages, so both are validated before
//! touching the filesystem:
//! - bucket must be a single non-empty path segment
//! - key must be relative and must not contain `..` components

use std::future::Future;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use sift_core::types::StorageLocator;

use crate::error::LogPipelineError;

/// Trait abstracting object storage reads.
///
/// The trait is `Send + Sync + 'static`, allowing safe sharing across async contexts.
///
/// # Errors
///
/// A missing or unreadable object is `LogPipelineError::Storage`. Callers treat
/// it as fatal for the whole run.
pub trait ObjectStore: Send + Sync + 'static {
    /// Opens an object for sequential reading.
    fn get_object(
        &self,
        locator: &StorageLocator,
    ) -> impl Future<Output = Result<Box<dyn Read + Send>, LogPipelineError>> + Send;
}

/// Filesystem-backed object store.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a locator to a path under the root.
    ///
    /// # Errors
    ///
    /// Returns `LogPipelineError::Storage` for path traversal attempts.
    pub fn resolve(&self, locator: &StorageLocator) -> Result<PathBuf, LogPipelineError> {
        let bucket = Path::new(&locator.bucket);
        let mut bucket_parts = bucket.components();
        match (bucket_parts.next(), bucket_parts.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => {
                return Err(storage_error(
                    locator,
                    "bucket must be a single path segment",
                ));
            }
        }

        if locator.key.is_empty() {
            return Err(storage_error(locator, "key must not be empty"));
        }

        let key = Path::new(&locator.key);
        if key
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(storage_error(
                locator,
                "key must be a relative path without '..' components",
            ));
        }

        Ok(self.root.join(bucket).join(key))
    }
}

impl ObjectStore for LocalObjectStore {
    async fn get_object(
        &self,
        locator: &StorageLocator,
    ) -> Result<Box<dyn Read + Send>, LogPipelineError> {
        let path = self.resolve(locator)?;

        let file = tokio::fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                storage_error(locator, "object not found")
            } else {
                storage_error(locator, &e.to_string())
            }
        })?;

        tracing::debug!(bucket = %locator.bucket, key = %locator.key, "object opened");

        // gzip 디코더는 동기 Read를 요구하므로 std 파일로 변환
        Ok(Box::new(file.into_std().await))
    }
}

fn storage_error(locator: &StorageLocator, reason: &str) -> LogPipelineError {
    LogPipelineError::Storage {
        locator: locator.to_string(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_maps_bucket_and_key() {
        let store = LocalObjectStore::new("/srv/buckets");
        let path = store
            .resolve(&StorageLocator::new("logs", "2024/01/15/a.json.gz"))
            .unwrap();
        assert_eq!(path, PathBuf::from("/srv/buckets/logs/2024/01/15/a.json.gz"));
    }

    #[test]
    fn resolve_rejects_parent_dir_in_key() {
        let store = LocalObjectStore::new("/srv/buckets");
        let err = store
            .resolve(&StorageLocator::new("logs", "../../etc/passwd"))
            .unwrap_err();
        assert!(matches!(err, LogPipelineError::Storage { .. }));
    }

    #[test]
    fn resolve_rejects_absolute_key() {
        let store = LocalObjectStore::new("/srv/buckets");
        assert!(
            store
                .resolve(&StorageLocator::new("logs", "/etc/passwd"))
                .is_err()
        );
    }

    #[test]
    fn resolve_rejects_nested_bucket() {
        let store = LocalObjectStore::new("/srv/buckets");
        assert!(store.resolve(&StorageLocator::new("a/b", "k")).is_err());
        assert!(store.resolve(&StorageLocator::new("..", "k")).is_err());
        assert!(store.resolve(&StorageLocator::new("", "k")).is_err());
    }

    #[tokio::test]
    async fn missing_object_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let result = store
            .get_object(&StorageLocator::new("logs", "missing.json.gz"))
            .await;
        match result {
            Err(LogPipelineError::Storage { locator, reason }) => {
                assert_eq!(locator, "logs/missing.json.gz");
                assert!(reason.contains("not found"));
            }
            _ => panic!("expected storage error"),
        }
    }

    #[tokio::test]
    async fn reads_existing_object() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("logs")).unwrap();
        std::fs::write(dir.path().join("logs/obj.bin"), b"payload").unwrap();

        let store = LocalObjectStore::new(dir.path());
        let mut reader = store
            .get_object(&StorageLocator::new("logs", "obj.bin"))
            .await
            .unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"payload");
    }
}
