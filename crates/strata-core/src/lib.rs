//! # strata-core
//!
//! Core abstractions for the Strata table catalog.
//!
//! This crate provides the foundational types used across all Strata
//! components:
//!
//! - **Identifiers**: Strongly-typed table IDs
//! - **Storage Locations**: Parsed storage URIs plus connection parameters
//! - **Storage Backend**: Abstract object-storage contract with CAS writes
//! - **Error Types**: Shared error definitions and result types
//! - **Observability**: Logging initialization and span helpers
//!
//! ## Crate Boundary
//!
//! `strata-core` is the **only** crate allowed to define shared primitives.
//! The catalog domain (`strata-catalog`) builds on these contracts and never
//! reaches around them to a concrete storage SDK.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod id;
pub mod location;
pub mod observability;
pub mod storage;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use strata_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::id::TableId;
    pub use crate::location::{LocationError, LocationScheme, StorageLocation};
    pub use crate::storage::{
        MemoryBackend, ObjectMeta, StorageBackend, WritePrecondition, WriteResult,
    };
}

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use id::TableId;
pub use location::{LocationError, LocationScheme, StorageLocation};
pub use observability::{LogFormat, init_logging};
pub use storage::{MemoryBackend, ObjectMeta, StorageBackend, WritePrecondition, WriteResult};
