//! Filesystem-backed blob store.
//!
//! Persists each resource as `<kind>.json` under a root directory. Suitable
//! for single-node deployments and as the local fallback when the remote
//! store is not configured.

use crate::store::BlobStore;
use async_trait::async_trait;
use plotdeck_core::{ResourceKind, StoreError, StoreResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Blob store writing one JSON file per resource kind.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is created lazily on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory holding the resource files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, kind: ResourceKind) -> PathBuf {
        self.root.join(format!("{}.json", kind.as_str()))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn read(&self, kind: ResourceKind) -> StoreResult<String> {
        match tokio::fs::read_to_string(self.path_for(kind)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound { kind }),
            Err(e) => Err(StoreError::io(kind, e)),
        }
    }

    async fn write(&self, kind: ResourceKind, content: &str) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::io(kind, e))?;
        // Write to a sibling temp file first so a crash mid-write cannot
        // truncate the previous version.
        let tmp = self.root.join(format!("{}.json.tmp", kind.as_str()));
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| StoreError::io(kind, e))?;
        tokio::fs::rename(&tmp, self.path_for(kind))
            .await
            .map_err(|e| StoreError::io(kind, e))
    }
}
