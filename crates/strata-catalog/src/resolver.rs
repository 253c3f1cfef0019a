//! Attachment resolution: location → live snapshot pointer.
//!
//! The resolver turns a storage location into the table's current committed
//! snapshot. It holds no pointer state of its own: every call re-reads the
//! manifest at the location, so a result is never staler than the call
//! itself. This is the whole synchronization story for attached tables: the
//! owner commits, the manifest swings, and the next resolution observes it.
//! Two concurrent reads may legitimately observe different owner snapshots.
//!
//! Known limitation, carried forward deliberately: the resolver tracks data
//! snapshots, not schema versions. An owner-side schema change is not
//! reflected through an existing attachment.

use std::sync::Arc;

use strata_core::observability::resolve_span;
use strata_core::storage::StorageBackend;
use strata_core::{Error, StorageLocation};
use tracing::Instrument;

use crate::error::{CatalogError, Result};
use crate::manifest::{self, MANIFEST_FILE, SnapshotPointer, TableManifest};
use crate::metrics;

/// Resolves storage locations into validated snapshot pointers.
///
/// Purely functional with respect to catalog state: the only side effect is
/// I/O against the external location.
pub struct AttachmentResolver {
    backend: Arc<dyn StorageBackend>,
}

impl AttachmentResolver {
    /// Creates a resolver reading through the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Validates that `location` holds a live table at attach time.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InvalidLocation`] when no valid table manifest
    ///   exists at the location.
    /// - [`CatalogError::ConnectionError`] when the endpoint is unreachable
    ///   or rejects the credentials.
    pub async fn probe(&self, table: &str, location: &StorageLocation) -> Result<SnapshotPointer> {
        let span = resolve_span(table, &location.uri());
        async {
            tracing::debug!("probing attach location");
            match self.load_manifest(location).await {
                Ok(manifest) => Ok(manifest.pointer()),
                Err(CatalogError::Storage(Error::NotFound(_))) => {
                    Err(CatalogError::InvalidLocation {
                        message: format!("no table manifest found at {location}"),
                    })
                }
                Err(CatalogError::Corrupted { path, message }) => {
                    Err(CatalogError::InvalidLocation {
                        message: format!("metadata at {path} is not a table manifest: {message}"),
                    })
                }
                Err(other) => Err(other),
            }
        }
        .instrument(span)
        .await
    }

    /// Resolves the *current* snapshot pointer for the table at `location`.
    ///
    /// Re-reads the manifest on every call; never serves a cached pointer.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::TableNotFound`] when the manifest has disappeared
    ///   since attach time.
    /// - [`CatalogError::ConnectionError`] on endpoint/credential failures.
    /// - [`CatalogError::Corrupted`] when the manifest does not parse.
    pub async fn resolve(&self, table: &str, location: &StorageLocation) -> Result<SnapshotPointer> {
        let span = resolve_span(table, &location.uri());
        async {
            let manifest = match self.load_manifest(location).await {
                Ok(manifest) => manifest,
                Err(CatalogError::Storage(Error::NotFound(_))) => {
                    return Err(CatalogError::TableNotFound {
                        table: table.to_string(),
                    });
                }
                Err(other) => return Err(other),
            };

            metrics::record_resolution();
            tracing::debug!(version = manifest.snapshot_version, "resolved current snapshot");
            Ok(manifest.pointer())
        }
        .instrument(span)
        .await
    }

    /// Resolves the current snapshot and loads its complete row set,
    /// verifying the payload checksum recorded at commit time.
    ///
    /// # Errors
    ///
    /// Everything [`AttachmentResolver::resolve`] returns, plus
    /// [`CatalogError::Corrupted`] when the row payload fails verification.
    pub async fn read_rows(
        &self,
        table: &str,
        location: &StorageLocation,
    ) -> Result<(SnapshotPointer, Vec<serde_json::Value>)> {
        let span = resolve_span(table, &location.uri());
        async {
            let manifest = match self.load_manifest(location).await {
                Ok(manifest) => manifest,
                Err(CatalogError::Storage(Error::NotFound(_))) => {
                    return Err(CatalogError::TableNotFound {
                        table: table.to_string(),
                    });
                }
                Err(other) => return Err(other),
            };

            let rows_key = location.key(&TableManifest::rows_file(manifest.snapshot_version));
            let bytes = self
                .backend
                .get(&rows_key)
                .await
                .map_err(|e| map_io_error(e, &rows_key))?;

            if manifest::sha256_hex(&bytes) != manifest.rows_checksum_sha256 {
                return Err(CatalogError::Corrupted {
                    path: rows_key,
                    message: "row payload checksum does not match manifest".into(),
                });
            }

            let rows: Vec<serde_json::Value> =
                serde_json::from_slice(&bytes).map_err(|e| CatalogError::Corrupted {
                    path: rows_key,
                    message: format!("row payload does not parse: {e}"),
                })?;

            metrics::record_resolution();
            Ok((manifest.pointer(), rows))
        }
        .instrument(span)
        .await
    }

    async fn load_manifest(&self, location: &StorageLocation) -> Result<TableManifest> {
        let manifest_key = location.key(MANIFEST_FILE);
        let bytes = match self.backend.get(&manifest_key).await {
            Ok(bytes) => bytes,
            Err(e @ Error::NotFound(_)) => return Err(CatalogError::Storage(e)),
            Err(e) => return Err(map_io_error(e, &manifest_key)),
        };
        manifest::parse_manifest(&manifest_key, &bytes)
    }
}

/// Maps a backend failure to the resolution taxonomy. Missing objects keep
/// their identity; everything else is a connectivity failure from the
/// catalog's point of view.
fn map_io_error(error: Error, path: &str) -> CatalogError {
    match error {
        Error::NotFound(message) => CatalogError::Storage(Error::NotFound(message)),
        other => CatalogError::connection(format!("reading {path} failed"), other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::SnapshotWriter;
    use async_trait::async_trait;
    use bytes::Bytes;
    use serde_json::json;
    use strata_core::MemoryBackend;
    use strata_core::storage::{ObjectMeta, WritePrecondition, WriteResult};

    fn location() -> StorageLocation {
        StorageLocation::parse("memory://lake/orders").expect("valid")
    }

    /// Backend whose every operation fails like an unreachable endpoint.
    struct UnreachableBackend;

    impl UnreachableBackend {
        fn refused() -> strata_core::Error {
            strata_core::Error::storage_with_source(
                "endpoint unreachable",
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
            )
        }
    }

    #[async_trait]
    impl StorageBackend for UnreachableBackend {
        async fn get(&self, _path: &str) -> strata_core::Result<Bytes> {
            Err(Self::refused())
        }

        async fn put(
            &self,
            _path: &str,
            _data: Bytes,
            _precondition: WritePrecondition,
        ) -> strata_core::Result<WriteResult> {
            Err(Self::refused())
        }

        async fn delete(&self, _path: &str) -> strata_core::Result<()> {
            Err(Self::refused())
        }

        async fn list(&self, _prefix: &str) -> strata_core::Result<Vec<ObjectMeta>> {
            Err(Self::refused())
        }

        async fn head(&self, _path: &str) -> strata_core::Result<Option<ObjectMeta>> {
            Err(Self::refused())
        }
    }

    #[tokio::test]
    async fn test_probe_empty_location_is_invalid() {
        let backend = Arc::new(MemoryBackend::new());
        let resolver = AttachmentResolver::new(backend);

        let err = resolver
            .probe("orders_ro", &location())
            .await
            .expect_err("no manifest present");
        assert!(matches!(err, CatalogError::InvalidLocation { .. }));
    }

    #[tokio::test]
    async fn test_probe_garbage_manifest_is_invalid() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .put(
                "lake/orders/manifest.json",
                bytes::Bytes::from("not json"),
                strata_core::WritePrecondition::None,
            )
            .await
            .unwrap();

        let resolver = AttachmentResolver::new(backend);
        let err = resolver
            .probe("orders_ro", &location())
            .await
            .expect_err("garbage manifest");
        assert!(matches!(err, CatalogError::InvalidLocation { .. }));
    }

    #[tokio::test]
    async fn test_probe_unreachable_endpoint_is_connection_error() {
        let resolver = AttachmentResolver::new(Arc::new(UnreachableBackend));

        let err = resolver
            .probe("orders_ro", &location())
            .await
            .expect_err("endpoint down");
        match err {
            CatalogError::ConnectionError { ref source, .. } => {
                assert!(source.is_some(), "backend failure must be chained as the cause");
            }
            other => panic!("expected ConnectionError, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_unreachable_endpoint_is_connection_error() {
        let resolver = AttachmentResolver::new(Arc::new(UnreachableBackend));

        let err = resolver
            .resolve("orders_ro", &location())
            .await
            .expect_err("endpoint down");
        assert!(matches!(err, CatalogError::ConnectionError { .. }));
        // The cause chain reaches the backend error.
        let source = std::error::Error::source(&err).expect("source chained");
        assert!(source.to_string().contains("endpoint unreachable"));
    }

    #[tokio::test]
    async fn test_resolve_observes_latest_commit() {
        let backend = Arc::new(MemoryBackend::new());
        let writer = SnapshotWriter::new(backend.clone(), location());
        let resolver = AttachmentResolver::new(backend);

        writer.commit(&[json!({"x": 1})]).await.expect("v1");
        let p1 = resolver.resolve("orders_ro", &location()).await.expect("resolve");
        assert_eq!(p1.version, 1);

        writer.commit(&[json!({"x": 2})]).await.expect("v2");
        let p2 = resolver.resolve("orders_ro", &location()).await.expect("resolve");
        assert_eq!(p2.version, 2, "resolution must never serve a cached pointer");
    }

    #[tokio::test]
    async fn test_resolve_missing_manifest_is_not_found() {
        let backend = Arc::new(MemoryBackend::new());
        let resolver = AttachmentResolver::new(backend);

        let err = resolver
            .resolve("orders_ro", &location())
            .await
            .expect_err("manifest missing");
        assert!(matches!(err, CatalogError::TableNotFound { ref table } if table == "orders_ro"));
    }

    #[tokio::test]
    async fn test_read_rows_returns_committed_rows() {
        let backend = Arc::new(MemoryBackend::new());
        let writer = SnapshotWriter::new(backend.clone(), location());
        let resolver = AttachmentResolver::new(backend);

        let rows = vec![json!({"x": 1}), json!({"x": 2})];
        writer.commit(&rows).await.expect("commit");

        let (pointer, read) = resolver
            .read_rows("orders_ro", &location())
            .await
            .expect("read");
        assert_eq!(pointer.version, 1);
        assert_eq!(read, rows);
    }

    #[tokio::test]
    async fn test_read_rows_detects_tampered_payload() {
        let backend = Arc::new(MemoryBackend::new());
        let writer = SnapshotWriter::new(backend.clone(), location());
        writer.commit(&[json!({"x": 1})]).await.expect("commit");

        // Overwrite the row payload behind the manifest's back.
        backend
            .put(
                "lake/orders/snapshots/v1/rows.json",
                bytes::Bytes::from("[]"),
                strata_core::WritePrecondition::None,
            )
            .await
            .unwrap();

        let resolver = AttachmentResolver::new(backend);
        let err = resolver
            .read_rows("orders_ro", &location())
            .await
            .expect_err("checksum mismatch");
        assert!(matches!(err, CatalogError::Corrupted { .. }));
    }
}
