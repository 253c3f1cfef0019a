//! Per-table commit manifests and snapshot pointers.
//!
//! Every table location carries one durable `manifest.json` naming the
//! current committed snapshot. The owner table's commit protocol is the only
//! writer; attachments read it and nothing else. Commits are CAS'd against
//! the manifest's storage version token, so concurrent committers cannot
//! silently overwrite each other.
//!
//! # Storage Layout
//!
//! ```text
//! {location}/
//! ├── manifest.json            # Current snapshot pointer (CAS-committed)
//! └── snapshots/
//!     ├── v1/rows.json         # Immutable row set at version 1
//!     └── v2/rows.json
//! ```
//!
//! Snapshot objects are immutable once written; a commit writes the new
//! version's objects first and publishes them by swinging the manifest.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use strata_core::storage::{StorageBackend, WritePrecondition, WriteResult};
use strata_core::StorageLocation;

use crate::error::{CatalogError, Result};
use crate::metrics;

/// File name of the per-table manifest, relative to the table location.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Maximum CAS retries for a snapshot commit.
const DEFAULT_MAX_CAS_RETRIES: u32 = 10;

/// Immutable reference to one committed state of a table's data.
///
/// Produced only by the owner table's commit protocol; consumed read-only by
/// attachments. Two pointers with the same version refer to identical data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPointer {
    /// Monotonically increasing commit version.
    pub version: u64,
    /// Path of the snapshot directory, relative to the table location.
    pub snapshot_path: String,
    /// When this snapshot was committed.
    pub committed_at: DateTime<Utc>,
}

/// The durable per-table commit record stored at `{location}/manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableManifest {
    /// Manifest schema version.
    pub format_version: u32,
    /// Current snapshot version.
    pub snapshot_version: u64,
    /// Path to the current snapshot directory, relative to the location.
    pub snapshot_path: String,
    /// SHA-256 checksum of the snapshot's row payload.
    pub rows_checksum_sha256: String,
    /// Number of rows in the current snapshot.
    pub row_count: u64,
    /// Last commit timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TableManifest {
    /// Returns the snapshot directory path for a version.
    #[must_use]
    pub fn snapshot_dir(version: u64) -> String {
        format!("snapshots/v{version}")
    }

    /// Returns the row payload path for a version, relative to the location.
    #[must_use]
    pub fn rows_file(version: u64) -> String {
        format!("snapshots/v{version}/rows.json")
    }

    /// Returns the snapshot pointer this manifest publishes.
    #[must_use]
    pub fn pointer(&self) -> SnapshotPointer {
        SnapshotPointer {
            version: self.snapshot_version,
            snapshot_path: self.snapshot_path.clone(),
            committed_at: self.updated_at,
        }
    }
}

/// Owner-side snapshot commit writer.
///
/// This is the minimal slice of the owner table's commit protocol the catalog
/// carries: enough to produce committed snapshots that attachments can
/// observe. It writes the new version's immutable row payload first, then
/// publishes it by CAS-updating the manifest, retrying from fresh state when
/// it loses the race.
pub struct SnapshotWriter {
    backend: Arc<dyn StorageBackend>,
    location: StorageLocation,
    cas_max_retries: u32,
}

impl SnapshotWriter {
    /// Creates a writer committing to the given location.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>, location: StorageLocation) -> Self {
        Self {
            backend,
            location,
            cas_max_retries: DEFAULT_MAX_CAS_RETRIES,
        }
    }

    /// Sets the maximum CAS retries for commits.
    #[must_use]
    pub const fn with_cas_retries(mut self, max_retries: u32) -> Self {
        self.cas_max_retries = max_retries;
        self
    }

    /// Returns the location this writer commits to.
    #[must_use]
    pub const fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Commits `rows` as the table's next snapshot.
    ///
    /// The provided rows become the complete row set of the new version.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::CommitConflict`] if the manifest CAS loses the
    /// race after all retries, or a storage/serialization error if writes
    /// fail.
    pub async fn commit(&self, rows: &[serde_json::Value]) -> Result<SnapshotPointer> {
        let manifest_key = self.location.key(MANIFEST_FILE);
        let rows_bytes = Bytes::from(serde_json::to_vec(rows).map_err(|e| {
            CatalogError::Serialization {
                message: format!("serialize snapshot rows: {e}"),
            }
        })?);
        let checksum = sha256_hex(&rows_bytes);

        for attempt in 1..=self.cas_max_retries {
            let (current, precondition) = match self.backend.head(&manifest_key).await? {
                Some(meta) => {
                    let bytes = self.backend.get(&manifest_key).await?;
                    let manifest: TableManifest = parse_manifest(&manifest_key, &bytes)?;
                    (
                        Some(manifest),
                        WritePrecondition::MatchesVersion(meta.version),
                    )
                }
                None => (None, WritePrecondition::DoesNotExist),
            };

            let next_version = current.as_ref().map_or(1, |m| m.snapshot_version + 1);
            let rows_key = self.location.key(&TableManifest::rows_file(next_version));

            // Snapshot objects are immutable; an existing object at this
            // version means another committer already claimed it.
            match self
                .backend
                .put(&rows_key, rows_bytes.clone(), WritePrecondition::DoesNotExist)
                .await?
            {
                WriteResult::Success { .. } => {}
                WriteResult::PreconditionFailed { .. } => {
                    metrics::record_cas_retry("snapshot_commit");
                    continue;
                }
            }

            let manifest = TableManifest {
                format_version: 1,
                snapshot_version: next_version,
                snapshot_path: TableManifest::snapshot_dir(next_version),
                rows_checksum_sha256: checksum.clone(),
                row_count: rows.len() as u64,
                updated_at: Utc::now(),
            };
            let manifest_bytes =
                Bytes::from(serde_json::to_vec(&manifest).map_err(|e| {
                    CatalogError::Serialization {
                        message: format!("serialize manifest: {e}"),
                    }
                })?);

            match self
                .backend
                .put(&manifest_key, manifest_bytes, precondition)
                .await?
            {
                WriteResult::Success { .. } => {
                    tracing::debug!(
                        location = %self.location,
                        version = next_version,
                        rows = rows.len(),
                        "snapshot committed"
                    );
                    return Ok(manifest.pointer());
                }
                WriteResult::PreconditionFailed { .. } => {
                    metrics::record_cas_retry("snapshot_commit");
                    if attempt == self.cas_max_retries {
                        return Err(CatalogError::CommitConflict {
                            message: format!(
                                "manifest update at {} lost CAS race after {attempt} attempts",
                                self.location
                            ),
                        });
                    }
                    // Another committer swung the manifest between read and
                    // write; retry from fresh state.
                    continue;
                }
            }
        }

        Err(CatalogError::CommitConflict {
            message: format!("commit retries exhausted at {}", self.location),
        })
    }
}

pub(crate) fn parse_manifest(path: &str, bytes: &[u8]) -> Result<TableManifest> {
    serde_json::from_slice(bytes).map_err(|e| CatalogError::Corrupted {
        path: path.to_string(),
        message: format!("manifest does not parse: {e}"),
    })
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
