//! Lifecycle handle tying the cache manager to its flush task.
//!
//! The handle owns the shutdown channel and the task's join handle, so
//! teardown is a single awaited call: signal, then join. The handle never
//! returns from `shutdown` while the flush loop could still be mid-pass.

use crate::cache::{CacheStats, FlushReport, ResourceCache};
use crate::flush::{flush_task, FlushConfig};
use crate::store::BlobStore;
use plotdeck_core::{ResourceKind, StoreResult};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A running write-back cache: manager plus background flush task.
///
/// Created once at startup, shut down once at process teardown. Cache
/// operations delegate to the owned [`ResourceCache`].
pub struct ResourceCacheHandle<S: BlobStore + 'static> {
    cache: Arc<ResourceCache<S>>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl<S: BlobStore + 'static> ResourceCacheHandle<S> {
    /// Construct the manager and start the flush task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: Arc<S>, config: FlushConfig) -> Self {
        let cache = Arc::new(ResourceCache::new(store));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(flush_task(Arc::clone(&cache), config, shutdown_rx));
        Self {
            cache,
            shutdown_tx,
            task,
        }
    }

    /// The underlying cache, for callers that want to share it directly.
    pub fn cache(&self) -> &Arc<ResourceCache<S>> {
        &self.cache
    }

    /// See [`ResourceCache::read`].
    pub async fn read(&self, kind: ResourceKind) -> StoreResult<String> {
        self.cache.read(kind).await
    }

    /// See [`ResourceCache::write`].
    pub async fn write(&self, kind: ResourceKind, content: String) -> StoreResult<()> {
        self.cache.write(kind, content).await
    }

    /// See [`ResourceCache::reload`].
    pub async fn reload(&self) -> StoreResult<()> {
        self.cache.reload().await
    }

    /// See [`ResourceCache::flush`].
    pub async fn flush(&self) -> FlushReport {
        self.cache.flush().await
    }

    /// See [`ResourceCache::stats`].
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Signal the flush task to stop and wait for it to finish.
    ///
    /// The task completes its current pass, runs the final drain pass if
    /// configured, and exits; only then does this return. All slot guards
    /// are released by that point.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Flush task failed during shutdown");
        }
    }
}
