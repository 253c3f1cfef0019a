//! # strata-catalog
//!
//! Snapshot-versioned table catalog with read-only attachments.
//!
//! This crate implements the catalog domain of Strata:
//!
//! - **Attachment Resolution**: Turn an external storage location into a live
//!   snapshot pointer, re-resolved on every read so attachments are never
//!   staler than the instant of query execution
//! - **Mutability Enforcement**: Classify every operation and reject mutations
//!   against read-only attached tables before any storage interaction
//! - **Lifecycle Management**: Reversible soft-drop/undrop, with hard purge
//!   refused for data the catalog entry does not own
//! - **Snapshot Commits**: CAS-committed per-table manifests publishing
//!   immutable snapshot payloads
//!
//! ## Architecture
//!
//! A table name resolves to a [`CatalogEntry`]; the [`MutabilityGuard`]
//! checks tier versus operation class before anything executes; reads go
//! through the [`AttachmentResolver`] to the current [`SnapshotPointer`];
//! lifecycle requests go through the [`LifecycleManager`]. The [`Catalog`]
//! registry composes all of it behind one DDL surface.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use strata_catalog::Catalog;
//! use strata_core::MemoryBackend;
//!
//! let catalog = Catalog::new(Arc::new(MemoryBackend::new()));
//! catalog.create_table("orders", "s3://lake/orders", []).await?;
//! catalog.attach_table("orders_ro", "s3://lake/orders", [], true).await?;
//!
//! // Reflects the owner's latest committed snapshot, every time.
//! let rows = catalog.read_rows("orders_ro").await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod error;
pub mod guard;
pub mod lifecycle;
pub mod manifest;
pub mod metrics;
pub mod operation;
pub mod resolver;
pub mod table;

// Re-export main types at crate root
pub use catalog::Catalog;
pub use error::{CatalogError, Result};
pub use guard::MutabilityGuard;
pub use lifecycle::{LifecycleManager, LifecycleTransition};
pub use manifest::{MANIFEST_FILE, SnapshotPointer, SnapshotWriter, TableManifest};
pub use operation::{MutationRequest, OperationClass, OperationKind};
pub use resolver::AttachmentResolver;
pub use table::{CatalogEntry, LifecycleState, MutabilityTier};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::catalog::Catalog;
    pub use crate::error::{CatalogError, Result};
    pub use crate::manifest::{SnapshotPointer, SnapshotWriter};
    pub use crate::operation::{MutationRequest, OperationClass, OperationKind};
    pub use crate::resolver::AttachmentResolver;
    pub use crate::table::{CatalogEntry, LifecycleState, MutabilityTier};
}
