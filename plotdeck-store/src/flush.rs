//! Background flush task.
//!
//! A long-running task that wakes on a fixed period and pushes dirty
//! resources to the backing store. Per-kind failures are isolated: the loop
//! logs, re-arms the slot, and continues to the next kind and the next tick.
//! The only fatal condition is the cooperative shutdown signal.

use crate::cache::ResourceCache;
use crate::store::BlobStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

/// Default seconds between flush passes.
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 10;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the background flush task.
#[derive(Debug, Clone)]
pub struct FlushConfig {
    /// Time between flush passes (default: 10 seconds). The period is fixed:
    /// it is not adaptive and a pass runs even when nothing is dirty.
    pub interval: Duration,

    /// Run one final flush pass after the shutdown signal so pending writes
    /// survive an orderly termination (default: true).
    pub flush_on_shutdown: bool,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_FLUSH_INTERVAL_SECS),
            flush_on_shutdown: true,
        }
    }
}

impl FlushConfig {
    /// Create a FlushConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `PLOTDECK_FLUSH_INTERVAL_SECS`: seconds between passes (default: 10)
    /// - `PLOTDECK_FLUSH_ON_SHUTDOWN`: final pass on shutdown (default: true)
    pub fn from_env() -> Self {
        let interval = Duration::from_secs(
            std::env::var("PLOTDECK_FLUSH_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_FLUSH_INTERVAL_SECS),
        );

        let flush_on_shutdown = std::env::var("PLOTDECK_FLUSH_ON_SHUTDOWN")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(true);

        Self {
            interval,
            flush_on_shutdown,
        }
    }

    /// Configuration for development/testing with a short period.
    pub fn development() -> Self {
        Self {
            interval: Duration::from_secs(1),
            flush_on_shutdown: true,
        }
    }
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// Run flush passes until the shutdown signal is received.
///
/// Each tick calls [`ResourceCache::flush`], which isolates per-kind
/// failures; this loop never exits because of them. Shutdown waits for an
/// in-flight pass to finish before breaking, so no slot guard is held when
/// the task returns, and (if configured) one final pass drains pending
/// writes.
///
/// # Arguments
///
/// * `cache` - The cache to reconcile
/// * `config` - Flush period and shutdown behavior
/// * `shutdown_rx` - Watch receiver for the shutdown signal
///
/// # Example
///
/// ```ignore
/// let (shutdown_tx, shutdown_rx) = watch::channel(false);
/// let task = tokio::spawn(flush_task(Arc::clone(&cache), config, shutdown_rx));
///
/// // Later, during teardown:
/// let _ = shutdown_tx.send(true);
/// task.await?;
/// ```
pub async fn flush_task<S: BlobStore>(
    cache: Arc<ResourceCache<S>>,
    config: FlushConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut tick = interval(config.interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        interval_secs = config.interval.as_secs(),
        "Flush task started"
    );

    loop {
        tokio::select! {
            // Checked first so a signaled shutdown always wins over a tick
            // that became ready at the same time.
            biased;

            changed = shutdown_rx.changed() => {
                // A closed channel means the handle is gone; treat it as
                // shutdown rather than spinning.
                if changed.is_err() || *shutdown_rx.borrow() {
                    tracing::info!("Flush task shutting down");
                    break;
                }
            }

            _ = tick.tick() => {
                let report = cache.flush().await;
                if report.failed > 0 {
                    tracing::warn!(
                        flushed = report.flushed,
                        failed = report.failed,
                        "Flush pass completed with failures"
                    );
                } else if report.flushed > 0 {
                    tracing::debug!(flushed = report.flushed, "Flush pass completed");
                }
            }
        }
    }

    if config.flush_on_shutdown {
        let report = cache.flush().await;
        if report.flushed > 0 || report.failed > 0 {
            tracing::info!(
                flushed = report.flushed,
                failed = report.failed,
                "Final flush pass completed"
            );
        }
    }

    tracing::info!("Flush task stopped");
}
