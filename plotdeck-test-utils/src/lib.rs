//! Test fixtures for the plotdeck storage layer.
//!
//! Provides [`ScriptedBlobStore`], a fully observable [`BlobStore`] for
//! exercising the write-back cache: it counts reads per kind, journals every
//! write attempt, injects failures on demand, and can gate reads so tests
//! can hold a fetch open while asserting what the rest of the cache does.

use async_trait::async_trait;
use plotdeck_core::{ResourceKind, StoreError, StoreResult};
use plotdeck_store::BlobStore;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// One entry in the write journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAttempt {
    pub kind: ResourceKind,
    pub content: String,
    /// Whether the store accepted the write (false = injected failure).
    pub accepted: bool,
}

/// Scriptable in-memory blob store for tests.
///
/// All scripting methods take `&self`; the store is meant to be shared with
/// the cache under test via `Arc`.
#[derive(Debug, Default)]
pub struct ScriptedBlobStore {
    blobs: Mutex<HashMap<ResourceKind, String>>,
    reads: Mutex<HashMap<ResourceKind, u64>>,
    journal: Mutex<Vec<WriteAttempt>>,
    failing_reads: Mutex<HashSet<ResourceKind>>,
    failing_writes: Mutex<HashSet<ResourceKind>>,
    gates: Mutex<HashMap<ResourceKind, Arc<Semaphore>>>,
}

impl ScriptedBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a resource, as if written by a previous process.
    pub fn seed(&self, kind: ResourceKind, content: impl Into<String>) {
        self.blobs.lock().unwrap().insert(kind, content.into());
    }

    /// The currently stored content for a kind, if any.
    pub fn get(&self, kind: ResourceKind) -> Option<String> {
        self.blobs.lock().unwrap().get(&kind).cloned()
    }

    /// Number of `read` calls issued for this kind, including failed ones.
    pub fn read_count(&self, kind: ResourceKind) -> u64 {
        self.reads.lock().unwrap().get(&kind).copied().unwrap_or(0)
    }

    /// Every write attempt seen so far, in order.
    pub fn write_journal(&self) -> Vec<WriteAttempt> {
        self.journal.lock().unwrap().clone()
    }

    /// Number of write attempts for this kind, including rejected ones.
    pub fn write_attempts(&self, kind: ResourceKind) -> u64 {
        self.journal
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.kind == kind)
            .count() as u64
    }

    /// Make subsequent reads of this kind fail with `Unavailable`.
    pub fn fail_reads(&self, kind: ResourceKind) {
        self.failing_reads.lock().unwrap().insert(kind);
    }

    /// Stop failing reads of this kind.
    pub fn heal_reads(&self, kind: ResourceKind) {
        self.failing_reads.lock().unwrap().remove(&kind);
    }

    /// Make subsequent writes of this kind fail with `WriteFailed`.
    pub fn fail_writes(&self, kind: ResourceKind) {
        self.failing_writes.lock().unwrap().insert(kind);
    }

    /// Stop failing writes of this kind.
    pub fn heal_writes(&self, kind: ResourceKind) {
        self.failing_writes.lock().unwrap().remove(&kind);
    }

    /// Block reads of this kind until [`release_reads`](Self::release_reads).
    pub fn hold_reads(&self, kind: ResourceKind) {
        self.gates
            .lock()
            .unwrap()
            .insert(kind, Arc::new(Semaphore::new(0)));
    }

    /// Unblock held reads of this kind.
    pub fn release_reads(&self, kind: ResourceKind) {
        if let Some(gate) = self.gates.lock().unwrap().remove(&kind) {
            gate.add_permits(Semaphore::MAX_PERMITS);
        }
    }

    fn gate_for(&self, kind: ResourceKind) -> Option<Arc<Semaphore>> {
        self.gates.lock().unwrap().get(&kind).cloned()
    }
}

#[async_trait]
impl BlobStore for ScriptedBlobStore {
    async fn read(&self, kind: ResourceKind) -> StoreResult<String> {
        *self.reads.lock().unwrap().entry(kind).or_insert(0) += 1;

        if let Some(gate) = self.gate_for(kind) {
            // Held open until the test releases the gate.
            let _permit = gate.acquire().await;
        }

        if self.failing_reads.lock().unwrap().contains(&kind) {
            return Err(StoreError::Unavailable {
                reason: "scripted read failure".to_string(),
            });
        }

        self.blobs
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .ok_or(StoreError::NotFound { kind })
    }

    async fn write(&self, kind: ResourceKind, content: &str) -> StoreResult<()> {
        let accepted = !self.failing_writes.lock().unwrap().contains(&kind);
        self.journal.lock().unwrap().push(WriteAttempt {
            kind,
            content: content.to_string(),
            accepted,
        });

        if !accepted {
            return Err(StoreError::WriteFailed {
                kind,
                reason: "scripted write failure".to_string(),
            });
        }

        self.blobs.lock().unwrap().insert(kind, content.to_string());
        Ok(())
    }
}
