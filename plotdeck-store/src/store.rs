//! Backing store abstraction and in-memory implementation.
//!
//! The cache never talks to a concrete service directly; it goes through
//! [`BlobStore`], a read/write-by-name contract implemented by storage
//! collaborators. The store owns its own backup and versioning policy.

use async_trait::async_trait;
use plotdeck_core::{ResourceKind, StoreError, StoreResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// Async contract for the remote blob store.
///
/// Implementations must be safe for concurrent use; the cache issues reads
/// and writes for different kinds with no ordering between them.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the full content of the named resource.
    ///
    /// # Errors
    ///
    /// Fails if the resource does not exist or the store is unreachable.
    async fn read(&self, kind: ResourceKind) -> StoreResult<String>;

    /// Create or overwrite the named resource with the given content.
    async fn write(&self, kind: ResourceKind, content: &str) -> StoreResult<()>;
}

/// In-memory blob store for tests and development.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<ResourceKind, String>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a resource, as if a previous process had written it.
    pub fn seed(&self, kind: ResourceKind, content: impl Into<String>) -> StoreResult<()> {
        self.blobs
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .insert(kind, content.into());
        Ok(())
    }

    /// The currently stored content for a kind, if any.
    pub fn get(&self, kind: ResourceKind) -> StoreResult<Option<String>> {
        Ok(self
            .blobs
            .read()
            .map_err(|_| StoreError::LockPoisoned)?
            .get(&kind)
            .cloned())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self, kind: ResourceKind) -> StoreResult<String> {
        self.blobs
            .read()
            .map_err(|_| StoreError::LockPoisoned)?
            .get(&kind)
            .cloned()
            .ok_or(StoreError::NotFound { kind })
    }

    async fn write(&self, kind: ResourceKind, content: &str) -> StoreResult<()> {
        self.blobs
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .insert(kind, content.to_string());
        Ok(())
    }
}
