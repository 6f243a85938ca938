//! Error types for plotdeck storage operations.

use crate::kind::ResourceKind;
use thiserror::Error;

/// Backing store and cache errors.
///
/// Variants are `Clone + PartialEq` so tests can assert on them directly.
/// I/O causes are carried as strings for the same reason.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Resource not found: {kind}")]
    NotFound { kind: ResourceKind },

    #[error("Read failed for {kind}: {reason}")]
    ReadFailed { kind: ResourceKind, reason: String },

    #[error("Write failed for {kind}: {reason}")]
    WriteFailed { kind: ResourceKind, reason: String },

    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("I/O error on {kind}: {reason}")]
    Io { kind: ResourceKind, reason: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Wrap an I/O failure for the given resource.
    pub fn io(kind: ResourceKind, err: std::io::Error) -> Self {
        StoreError::Io {
            kind,
            reason: err.to_string(),
        }
    }
}

/// Result type alias for all storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
