//! Plotdeck Storage - Write-Back Resource Cache
//!
//! Persists the dashboard's named JSON documents (settings, charts, points,
//! tags) to a slow backing store while shielding callers from its latency.
//! Reads are served from memory with lazy load-through, writes land in memory
//! immediately, and a background task reconciles dirty resources with the
//! store on a fixed schedule.
//!
//! Content is treated as an opaque string end to end; parsing and validation
//! belong to the layers above.
//!
//! # Usage
//!
//! ```ignore
//! use plotdeck_store::{FlushConfig, FsBlobStore, ResourceCacheHandle};
//! use plotdeck_core::ResourceKind;
//! use std::sync::Arc;
//!
//! let store = Arc::new(FsBlobStore::new("/var/lib/plotdeck"));
//! let handle = ResourceCacheHandle::spawn(store, FlushConfig::from_env());
//!
//! handle.write(ResourceKind::Tags, "[]".to_string()).await?;
//! let tags = handle.read(ResourceKind::Tags).await?;
//!
//! // On termination: stops the flush task and drains pending writes.
//! handle.shutdown().await;
//! ```

pub mod cache;
pub mod flush;
pub mod fs;
pub mod handle;
mod slot;
pub mod store;

pub use cache::{CacheStats, FlushReport, ResourceCache};
pub use flush::{flush_task, FlushConfig};
pub use fs::FsBlobStore;
pub use handle::ResourceCacheHandle;
pub use store::{BlobStore, MemoryBlobStore};
