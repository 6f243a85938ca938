//! Plotdeck Core - Resource Types
//!
//! Pure data types shared by the plotdeck storage layer. This crate contains
//! ONLY data types and error definitions - no I/O, no business logic.

pub mod error;
pub mod kind;

pub use error::{StoreError, StoreResult};
pub use kind::{ParseResourceKindError, ResourceKind};
