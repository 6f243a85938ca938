//! Per-resource slot: cached content, dirty flag, and the slot guard.
//!
//! Each slot coordinates concurrent access to exactly one resource kind.
//! The guard serializes the slot's slow transitions (lazy load, write,
//! flush snapshot, forced reload) so the backing store sees at most one
//! fetch per absent period; the state lock exists only so the fast read
//! path can observe loaded content without queueing behind an in-flight
//! fetch on some other code path.
//!
//! Guards are never shared across slots: operations on different resource
//! kinds proceed fully independently.

use plotdeck_core::{StoreError, StoreResult};
use std::future::Future;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;

/// The two fields the slot guard protects.
#[derive(Debug, Default)]
struct SlotState {
    /// `None` means not loaded since process start or since the last reload.
    content: Option<String>,
    /// A pending change not yet confirmed written to the backing store.
    dirty: bool,
}

/// Where a read was satisfied from. The manager feeds this into metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SlotRead {
    Cached(String),
    Fetched(String),
}

impl SlotRead {
    pub(crate) fn into_content(self) -> String {
        match self {
            SlotRead::Cached(c) | SlotRead::Fetched(c) => c,
        }
    }
}

/// State for one resource kind.
#[derive(Debug, Default)]
pub(crate) struct ResourceSlot {
    /// Critical sections on this lock are a few instructions long and never
    /// span an await point.
    state: RwLock<SlotState>,
    /// Serializes load, set, snapshot, and reload for this slot only.
    guard: Mutex<()>,
}

impl ResourceSlot {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> StoreResult<RwLockReadGuard<'_, SlotState>> {
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write_state(&self) -> StoreResult<RwLockWriteGuard<'_, SlotState>> {
        self.state.write().map_err(|_| StoreError::LockPoisoned)
    }

    /// Return cached content, fetching it first if the slot is absent.
    ///
    /// Double-checked: the fast path returns present content without taking
    /// the guard at all; otherwise the guard is acquired and the check is
    /// repeated, because concurrent callers race to fill an absent slot and
    /// only the first may fetch. The guard is held for the whole fetch -
    /// late arrivals wait rather than issuing duplicate fetches.
    ///
    /// # Errors
    ///
    /// A fetch failure propagates and leaves the slot absent; the next
    /// caller retries the fetch.
    pub(crate) async fn get_or_load<F, Fut>(&self, fetch: F) -> StoreResult<SlotRead>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<String>>,
    {
        if let Some(content) = self.read_state()?.content.clone() {
            return Ok(SlotRead::Cached(content));
        }

        let _guard = self.guard.lock().await;

        // Re-check under the guard: another caller may have filled the slot
        // (or a write may have landed) while we waited.
        if let Some(content) = self.read_state()?.content.clone() {
            return Ok(SlotRead::Cached(content));
        }

        let fetched = fetch().await?;
        {
            let mut state = self.write_state()?;
            state.content = Some(fetched.clone());
            state.dirty = false;
        }
        Ok(SlotRead::Fetched(fetched))
    }

    /// Buffer a new value. No I/O happens here; the value is visible to
    /// subsequent reads immediately and eligible for the next flush pass.
    pub(crate) async fn set(&self, value: String) -> StoreResult<()> {
        let _guard = self.guard.lock().await;
        let mut state = self.write_state()?;
        state.content = Some(value);
        state.dirty = true;
        Ok(())
    }

    /// Snapshot the content and clear the dirty flag, or return `None` if
    /// there is nothing to flush.
    ///
    /// The guard is released before the caller attempts any I/O on the
    /// snapshot, so lock-hold time stays O(1) and reads/writes against this
    /// slot proceed while a flush for a previous snapshot is in flight.
    pub(crate) async fn take_if_dirty(&self) -> StoreResult<Option<String>> {
        let _guard = self.guard.lock().await;
        let mut state = self.write_state()?;
        if !state.dirty {
            return Ok(None);
        }
        state.dirty = false;
        // dirty implies content is present: set() is the only place that
        // marks dirty and it always stores content first.
        Ok(state.content.clone())
    }

    /// Re-arm the dirty flag after a failed flush so the next pass retries.
    ///
    /// A no-op on an absent slot (a reload may have emptied it meanwhile),
    /// and harmless when a newer write already re-marked it.
    pub(crate) async fn mark_dirty(&self) -> StoreResult<()> {
        let _guard = self.guard.lock().await;
        let mut state = self.write_state()?;
        if state.content.is_some() {
            state.dirty = true;
        }
        Ok(())
    }

    /// Fetch unconditionally and overwrite the slot, discarding any
    /// unflushed local value. Remote content wins.
    ///
    /// # Errors
    ///
    /// A fetch failure propagates and the existing content and dirty flag
    /// are preserved untouched - a failed reload never blanks the slot.
    pub(crate) async fn force_reload<F, Fut>(&self, fetch: F) -> StoreResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<String>>,
    {
        let _guard = self.guard.lock().await;
        let fetched = fetch().await?;
        let mut state = self.write_state()?;
        state.content = Some(fetched.clone());
        state.dirty = false;
        Ok(fetched)
    }

    #[cfg(test)]
    pub(crate) fn is_dirty(&self) -> bool {
        self.state.read().unwrap().dirty
    }

    #[cfg(test)]
    pub(crate) fn is_loaded(&self) -> bool {
        self.state.read().unwrap().content.is_some()
    }
}
