//! Write-back cache manager.
//!
//! Owns one [`ResourceSlot`] per resource kind (arena-style: slots are never
//! aliased outside the manager) and the backing store handle. Reads are
//! load-through, writes are buffered in memory, and `flush` reconciles dirty
//! slots with the store - either from the background task or explicitly.
//!
//! There is no global lock: operations on different kinds interleave
//! arbitrarily, so the manager scales with the number of kinds instead of
//! serializing unrelated resources.

use crate::slot::{ResourceSlot, SlotRead};
use crate::store::BlobStore;
use plotdeck_core::{ResourceKind, StoreResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ============================================================================
// METRICS
// ============================================================================

/// Counters tracking cache activity since construction.
#[derive(Debug, Default)]
struct CacheMetrics {
    /// Reads served from memory.
    hits: AtomicU64,
    /// Reads that fetched from the backing store.
    fetches: AtomicU64,
    /// Buffered writes accepted.
    writes: AtomicU64,
    /// Flush passes started.
    flush_passes: AtomicU64,
    /// Resources successfully flushed.
    flushed: AtomicU64,
    /// Flush attempts that failed.
    flush_failures: AtomicU64,
    /// Completed full reloads.
    reloads: AtomicU64,
}

/// Snapshot of cache activity at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub fetches: u64,
    pub writes: u64,
    pub flush_passes: u64,
    pub flushed: u64,
    pub flush_failures: u64,
    pub reloads: u64,
}

impl CacheStats {
    /// Fraction of reads served from memory (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.fetches;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Outcome of one flush pass over all kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Resources written to the backing store this pass.
    pub flushed: u64,
    /// Resources whose flush attempt failed (re-marked dirty for retry).
    pub failed: u64,
}

// ============================================================================
// MANAGER
// ============================================================================

/// Write-back cache over the full set of resource kinds.
///
/// Constructed once at startup with the backing store; every
/// [`ResourceKind`] variant gets a slot, so operating on an unregistered
/// kind is not expressible.
pub struct ResourceCache<S: BlobStore> {
    store: Arc<S>,
    /// One slot per kind, indexed by discriminant ([`ResourceKind::ALL`]
    /// is in declaration order).
    slots: [ResourceSlot; ResourceKind::ALL.len()],
    metrics: CacheMetrics,
}

impl<S: BlobStore> ResourceCache<S> {
    /// Create a cache with every slot absent. No I/O happens until the
    /// first read.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            slots: ResourceKind::ALL.map(|_| ResourceSlot::new()),
            metrics: CacheMetrics::default(),
        }
    }

    /// The backing store this cache reconciles with.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn slot(&self, kind: ResourceKind) -> &ResourceSlot {
        &self.slots[kind as usize]
    }

    /// Read a resource, fetching it from the backing store on first use.
    ///
    /// # Errors
    ///
    /// Propagates the fetch failure when the slot is absent and the store
    /// read fails. Nothing is cached in that case; a subsequent read
    /// retries the fetch.
    pub async fn read(&self, kind: ResourceKind) -> StoreResult<String> {
        let store = Arc::clone(&self.store);
        let read = self
            .slot(kind)
            .get_or_load(|| async move { store.read(kind).await })
            .await?;

        match &read {
            SlotRead::Cached(_) => {
                self.metrics.hits.fetch_add(1, Ordering::Relaxed);
            }
            SlotRead::Fetched(content) => {
                self.metrics.fetches.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    kind = %kind,
                    bytes = content.len(),
                    "Loaded resource from backing store"
                );
            }
        }
        Ok(read.into_content())
    }

    /// Buffer a new value for a resource.
    ///
    /// Always succeeds locally and returns immediately; the remote write
    /// happens on a later flush pass and its outcome is not observable
    /// through this call.
    pub async fn write(&self, kind: ResourceKind, content: String) -> StoreResult<()> {
        self.slot(kind).set(content).await?;
        self.metrics.writes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(kind = %kind, "Buffered write, resource marked dirty");
        Ok(())
    }

    /// Refetch every resource from the backing store, discarding unflushed
    /// local writes. Remote content wins.
    ///
    /// Blocking in proportion to the number of kinds times remote-read
    /// latency; intended for explicit resync requests, not the hot path.
    ///
    /// # Errors
    ///
    /// The first fetch failure stops the pass and propagates. Slots
    /// reloaded before the failure keep their fresh content; the failing
    /// slot keeps its prior value.
    pub async fn reload(&self) -> StoreResult<()> {
        for kind in ResourceKind::ALL {
            let store = Arc::clone(&self.store);
            self.slot(kind)
                .force_reload(|| async move { store.read(kind).await })
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, kind = %kind, "Forced reload failed");
                    e
                })?;
        }
        self.metrics.reloads.fetch_add(1, Ordering::Relaxed);
        tracing::info!("Reloaded all resources from backing store");
        Ok(())
    }

    /// Run one reconciliation pass: push every dirty resource to the
    /// backing store.
    ///
    /// Store writes happen with no slot guard held. A failed write is
    /// logged, counted, and the slot re-marked dirty so the next pass
    /// retries; failures never abort the pass or surface to `write` callers.
    pub async fn flush(&self) -> FlushReport {
        self.metrics.flush_passes.fetch_add(1, Ordering::Relaxed);
        let mut report = FlushReport::default();

        for kind in ResourceKind::ALL {
            let snapshot = match self.slot(kind).take_if_dirty().await {
                Ok(Some(snapshot)) => snapshot,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(error = %e, kind = %kind, "Failed to snapshot dirty resource");
                    report.failed += 1;
                    self.metrics.flush_failures.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            };

            match self.store.write(kind, &snapshot).await {
                Ok(()) => {
                    report.flushed += 1;
                    self.metrics.flushed.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        kind = %kind,
                        bytes = snapshot.len(),
                        "Flushed resource to backing store"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    self.metrics.flush_failures.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(
                        error = %e,
                        kind = %kind,
                        "Flush failed, resource re-marked dirty for retry"
                    );
                    // A newer write racing this failure already re-marked
                    // the slot; re-marking again is a no-op.
                    if let Err(e) = self.slot(kind).mark_dirty().await {
                        tracing::error!(error = %e, kind = %kind, "Failed to re-mark resource dirty");
                    }
                }
            }
        }

        report
    }

    /// Snapshot of the activity counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.metrics.hits.load(Ordering::Relaxed),
            fetches: self.metrics.fetches.load(Ordering::Relaxed),
            writes: self.metrics.writes.load(Ordering::Relaxed),
            flush_passes: self.metrics.flush_passes.load(Ordering::Relaxed),
            flushed: self.metrics.flushed.load(Ordering::Relaxed),
            flush_failures: self.metrics.flush_failures.load(Ordering::Relaxed),
            reloads: self.metrics.reloads.load(Ordering::Relaxed),
        }
    }
}
