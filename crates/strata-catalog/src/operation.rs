//! Operation kinds and their read/mutating classification.
//!
//! Every statement the catalog surface recognizes is a variant of
//! [`OperationKind`]. The enum is closed on purpose: classification is a
//! total function over it, checked exhaustively at compile time, so no
//! operation can reach the guard unclassified. A statement kind the enum does
//! not carry simply cannot be constructed, which is the defensive posture the
//! guard relies on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of an operation issued against a catalog table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    /// Read rows from the table.
    Select,
    /// Delete rows.
    Delete,
    /// Update rows.
    Update,
    /// Remove all rows, keeping the table.
    Truncate,
    /// `ALTER TABLE ... ADD COLUMN`.
    AlterAddColumn,
    /// `ALTER TABLE ... SET OPTIONS`.
    AlterSetOptions,
    /// `ALTER TABLE ... FLASHBACK TO` an earlier snapshot.
    AlterFlashback,
    /// `ALTER TABLE ... RECLUSTER`.
    AlterRecluster,
    /// `ANALYZE TABLE` statistics collection.
    Analyze,
    /// `OPTIMIZE TABLE ... COMPACT`.
    OptimizeCompact,
    /// `OPTIMIZE TABLE ... COMPACT SEGMENT`.
    OptimizeCompactSegment,
    /// `OPTIMIZE TABLE ... PURGE` historical data.
    OptimizePurge,
    /// Soft drop: hide the table, keep its data and metadata.
    DropSoft,
    /// Hard drop: purge the table and destroy its underlying data.
    DropAll,
    /// Restore a soft-dropped table.
    Undrop,
    /// Render the table's DDL.
    ShowCreate,
}

/// Classification of an operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationClass {
    /// Observes table state without changing it.
    Read,
    /// Changes table data, schema, or destroys storage.
    Mutating,
    /// Toggles the catalog lifecycle flag only; never touches stored data.
    Lifecycle,
}

impl OperationKind {
    /// Every operation kind, in declaration order.
    pub const ALL: [Self; 16] = [
        Self::Select,
        Self::Delete,
        Self::Update,
        Self::Truncate,
        Self::AlterAddColumn,
        Self::AlterSetOptions,
        Self::AlterFlashback,
        Self::AlterRecluster,
        Self::Analyze,
        Self::OptimizeCompact,
        Self::OptimizeCompactSegment,
        Self::OptimizePurge,
        Self::DropSoft,
        Self::DropAll,
        Self::Undrop,
        Self::ShowCreate,
    ];

    /// Classifies this operation. Total over the enum; no default arm.
    #[must_use]
    pub const fn class(self) -> OperationClass {
        match self {
            Self::Select | Self::ShowCreate => OperationClass::Read,
            Self::Delete
            | Self::Update
            | Self::Truncate
            | Self::AlterAddColumn
            | Self::AlterSetOptions
            | Self::AlterFlashback
            | Self::AlterRecluster
            | Self::Analyze
            | Self::OptimizeCompact
            | Self::OptimizeCompactSegment
            | Self::OptimizePurge
            | Self::DropAll => OperationClass::Mutating,
            Self::DropSoft | Self::Undrop => OperationClass::Lifecycle,
        }
    }

    /// Returns the SQL-surface statement this kind corresponds to.
    #[must_use]
    pub const fn statement(self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Delete => "DELETE",
            Self::Update => "UPDATE",
            Self::Truncate => "TRUNCATE TABLE",
            Self::AlterAddColumn => "ALTER TABLE ADD COLUMN",
            Self::AlterSetOptions => "ALTER TABLE SET OPTIONS",
            Self::AlterFlashback => "ALTER TABLE FLASHBACK TO",
            Self::AlterRecluster => "ALTER TABLE RECLUSTER",
            Self::Analyze => "ANALYZE TABLE",
            Self::OptimizeCompact => "OPTIMIZE TABLE COMPACT",
            Self::OptimizeCompactSegment => "OPTIMIZE TABLE COMPACT SEGMENT",
            Self::OptimizePurge => "OPTIMIZE TABLE PURGE",
            Self::DropSoft => "DROP TABLE",
            Self::DropAll => "DROP TABLE ALL",
            Self::Undrop => "UNDROP TABLE",
            Self::ShowCreate => "SHOW CREATE TABLE",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.statement())
    }
}

/// An operation request against a named catalog table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationRequest {
    /// The kind of operation requested.
    pub kind: OperationKind,
    /// The target table name.
    pub table: String,
}

impl MutationRequest {
    /// Creates a request for the given operation and target table.
    #[must_use]
    pub fn new(kind: OperationKind, table: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
        }
    }
}
