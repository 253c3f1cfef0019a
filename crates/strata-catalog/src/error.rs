//! Error types for strata-catalog operations.
//!
//! Three families matter to callers:
//!
//! - **Resolution** (`InvalidLocation`, `ConnectionError`, `TableNotFound`):
//!   raised while turning a storage location into a snapshot pointer.
//!   Surfaced verbatim, never retried here; retry policy belongs to the
//!   storage connectivity layer.
//! - **Mutability** (`ReadOnlyViolation`): raised by the guard strictly
//!   before any storage interaction, so a rejected request leaves no partial
//!   side effects.
//! - **Lifecycle** (`AlreadyDropped`, `NotDropped`): raised by the lifecycle
//!   manager; the table's state is unchanged on failure.

use crate::operation::OperationKind;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur during catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The storage location could not be parsed, or the referenced path
    /// contains no valid table metadata.
    #[error("invalid location: {message}")]
    InvalidLocation {
        /// Description of what made the location invalid.
        message: String,
    },

    /// The storage endpoint rejected the credentials or was unreachable.
    #[error("connection error: {message}")]
    ConnectionError {
        /// Description of the connectivity failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The table (or its manifest) does not exist.
    #[error("table not found: {table}")]
    TableNotFound {
        /// The table that was looked up.
        table: String,
    },

    /// A table with this name already exists in the catalog.
    #[error("table already exists: {table}")]
    TableAlreadyExists {
        /// The conflicting table name.
        table: String,
    },

    /// A mutating operation was issued against a read-only attached table.
    #[error("table {table} is attached read-only, {operation} is not allowed")]
    ReadOnlyViolation {
        /// The rejected operation.
        operation: OperationKind,
        /// The target table.
        table: String,
    },

    /// Soft drop was requested on an already-dropped table.
    #[error("table {table} is already dropped")]
    AlreadyDropped {
        /// The target table.
        table: String,
    },

    /// Undrop was requested on a table that is not dropped.
    #[error("table {table} is not dropped")]
    NotDropped {
        /// The target table.
        table: String,
    },

    /// Stored data failed integrity verification.
    #[error("corrupted object at {path}: {message}")]
    Corrupted {
        /// Path of the corrupted object.
        path: String,
        /// Description of the integrity failure.
        message: String,
    },

    /// A snapshot commit lost the CAS race after exhausting retries.
    #[error("commit conflict: {message}")]
    CommitConflict {
        /// Description of the conflict.
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// A lower-level storage operation failed.
    #[error(transparent)]
    Storage(#[from] strata_core::Error),
}

impl CatalogError {
    /// Creates an invalid-location error with the given message.
    #[must_use]
    pub fn invalid_location(message: impl Into<String>) -> Self {
        Self::InvalidLocation {
            message: message.into(),
        }
    }

    /// Creates a connection error wrapping a lower-level cause.
    #[must_use]
    pub fn connection(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConnectionError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
