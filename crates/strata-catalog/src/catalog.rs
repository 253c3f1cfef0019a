//! The process-wide table catalog: registry plus DDL surface.
//!
//! The catalog owns the arena of [`CatalogEntry`] descriptors, keyed by
//! stable [`TableId`] with a name index on top. "Dropped" is a flag, not a
//! removal: soft-dropped entries stay in the arena (hidden from name lookup)
//! so undrop restores exactly the entry that was dropped, with no dangling
//! references and no re-resolution of the attachment.
//!
//! Every operation funnels through [`Catalog::admit`]: resolve the name to an
//! entry, then run the mutability guard. Nothing touches storage before the
//! guard has admitted the request.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use strata_core::observability::catalog_span;
use strata_core::storage::StorageBackend;
use strata_core::{StorageLocation, TableId};
use tracing::Instrument;

use crate::error::{CatalogError, Result};
use crate::lifecycle::LifecycleTransition;
use crate::manifest::SnapshotWriter;
use crate::operation::{MutationRequest, OperationKind};
use crate::resolver::AttachmentResolver;
use crate::table::{CatalogEntry, MutabilityTier};

/// Process-wide catalog state.
///
/// Constructed explicitly at startup and torn down by dropping it; there is
/// no ambient global. Interior locking covers the registry maps only; entry
/// lifecycle flags have their own per-entry serialization.
pub struct Catalog {
    backend: Arc<dyn StorageBackend>,
    resolver: AttachmentResolver,
    inner: RwLock<Registry>,
}

#[derive(Default)]
struct Registry {
    by_id: HashMap<TableId, Arc<CatalogEntry>>,
    by_name: HashMap<String, TableId>,
}

impl Catalog {
    /// Creates an empty catalog reading and writing through `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend: backend.clone(),
            resolver: AttachmentResolver::new(backend),
            inner: RwLock::new(Registry::default()),
        }
    }

    /// Returns the resolver this catalog reads through.
    #[must_use]
    pub const fn resolver(&self) -> &AttachmentResolver {
        &self.resolver
    }

    /// Creates a Normal-tier table owning `uri`, committing an initial empty
    /// snapshot so the table is immediately queryable.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidLocation`] for an unparseable URI,
    /// [`CatalogError::TableAlreadyExists`] for a taken name, or a storage
    /// error if the initial commit fails.
    pub async fn create_table(
        &self,
        name: &str,
        uri: &str,
        connection: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Arc<CatalogEntry>> {
        let span = catalog_span("create_table", name);
        async {
            let location = parse_location(uri, connection)?;
            self.ensure_name_free(name)?;

            let writer = SnapshotWriter::new(self.backend.clone(), location.clone());
            writer.commit(&[]).await?;

            let entry = Arc::new(CatalogEntry::new(name, location, MutabilityTier::Normal));
            self.insert(entry.clone())?;
            tracing::info!(uri = uri, "table created");
            Ok(entry)
        }
        .instrument(span)
        .await
    }

    /// Attaches a table over another table's storage location.
    ///
    /// The attachment holds a location reference only: it never allocates or
    /// deletes owner-table data. With `read_only`, the entry's tier is
    /// `ReadOnlyAttached` and every mutating operation will be rejected;
    /// without it the tier is `Normal`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidLocation`] when the URI does not parse
    /// or no valid table manifest exists at the location,
    /// [`CatalogError::ConnectionError`] when the endpoint is unreachable,
    /// and [`CatalogError::TableAlreadyExists`] for a taken name.
    pub async fn attach_table(
        &self,
        name: &str,
        uri: &str,
        connection: impl IntoIterator<Item = (String, String)>,
        read_only: bool,
    ) -> Result<Arc<CatalogEntry>> {
        let span = catalog_span("attach_table", name);
        async {
            let location = parse_location(uri, connection)?;
            self.ensure_name_free(name)?;

            // Validate the location points at a live table before registering.
            self.resolver.probe(name, &location).await?;

            let tier = if read_only {
                MutabilityTier::ReadOnlyAttached
            } else {
                MutabilityTier::Normal
            };
            let entry = Arc::new(CatalogEntry::new(name, location, tier));
            self.insert(entry.clone())?;
            tracing::info!(uri = uri, read_only = read_only, "table attached");
            Ok(entry)
        }
        .instrument(span)
        .await
    }

    /// Resolves `request` to its target entry and runs the mutability guard.
    ///
    /// This is the single choke point every operation passes through before
    /// any execution proceeds. The host engine calls this for operations it
    /// executes itself (DML on Normal-tier tables).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::TableNotFound`] for unknown or soft-dropped
    /// tables, or [`CatalogError::ReadOnlyViolation`] from the guard.
    pub fn admit(&self, request: &MutationRequest) -> Result<Arc<CatalogEntry>> {
        let entry = self.get(&request.table)?;
        entry.check(request)?;
        Ok(entry)
    }

    /// Looks up a visible table by name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::TableNotFound`] for unknown or soft-dropped
    /// tables.
    pub fn get(&self, name: &str) -> Result<Arc<CatalogEntry>> {
        let entry = self.get_any(name)?;
        if !entry.is_visible() {
            return Err(CatalogError::TableNotFound {
                table: name.to_string(),
            });
        }
        Ok(entry)
    }

    /// Drops a table. Without `all`, this is a reversible soft drop; with
    /// `all`, a hard purge that destroys the underlying data and removes the
    /// entry permanently.
    ///
    /// # Errors
    ///
    /// Hard purge on a `ReadOnlyAttached` table fails with
    /// [`CatalogError::ReadOnlyViolation`] because the data belongs to the
    /// owner table. Soft drop of an already-dropped table fails with
    /// [`CatalogError::AlreadyDropped`].
    pub async fn drop_table(&self, name: &str, all: bool) -> Result<()> {
        let span = catalog_span("drop_table", name);
        async {
            let entry = if all {
                // Purge is reachable only from Active.
                self.admit(&MutationRequest::new(OperationKind::DropAll, name))?
            } else {
                // Soft drop targets the arena entry even when already hidden,
                // so a repeated drop reports AlreadyDropped rather than
                // not-found.
                let entry = self.get_any(name)?;
                entry.check(&MutationRequest::new(OperationKind::DropSoft, name))?;
                entry
            };

            if all {
                // Guard admitted, so the tier is Normal and the data is ours.
                self.purge(&entry).await?;
                tracing::info!("table purged");
            } else {
                entry.apply_lifecycle(LifecycleTransition::DropSoft)?;
            }
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Restores a soft-dropped table to full visibility.
    ///
    /// The restored table has the same storage location, tier, and read
    /// behavior it had immediately before the drop.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::TableNotFound`] for unknown tables and
    /// [`CatalogError::NotDropped`] for tables that are active.
    pub fn undrop_table(&self, name: &str) -> Result<()> {
        let span = catalog_span("undrop_table", name);
        let _guard = span.enter();

        let entry = self.get_any(name)?;
        entry.apply_lifecycle(LifecycleTransition::Undrop)?;
        Ok(())
    }

    /// Renders the table's DDL, embedding the currently-resolved snapshot
    /// reference in the location path.
    ///
    /// # Errors
    ///
    /// Returns resolution errors from the snapshot lookup.
    pub async fn show_create_table(&self, name: &str) -> Result<String> {
        let span = catalog_span("show_create_table", name);
        async {
            let entry = self.admit(&MutationRequest::new(OperationKind::ShowCreate, name))?;
            let pointer = entry.resolve_current_snapshot(&self.resolver).await?;

            let location = entry.location();
            let snapshot_uri = format!("{}/{}", location.uri(), pointer.snapshot_path);
            let connection = render_connection(location);

            let ddl = match entry.tier() {
                MutabilityTier::ReadOnlyAttached => {
                    format!("ATTACH TABLE {name} '{snapshot_uri}'{connection} READ_ONLY")
                }
                MutabilityTier::Normal => {
                    format!("CREATE TABLE {name} LOCATION = '{snapshot_uri}'{connection}")
                }
            };
            Ok(ddl)
        }
        .instrument(span)
        .await
    }

    /// Reads the table's complete row set at its current snapshot.
    ///
    /// For attached tables the snapshot pointer is re-resolved on this call,
    /// so the result reflects every owner commit that completed before it.
    ///
    /// # Errors
    ///
    /// Returns resolution errors, or [`CatalogError::Corrupted`] if the row
    /// payload fails checksum verification.
    pub async fn read_rows(&self, name: &str) -> Result<Vec<serde_json::Value>> {
        let entry = self.admit(&MutationRequest::new(OperationKind::Select, name))?;
        let (_, rows) = self.resolver.read_rows(name, entry.location()).await?;
        Ok(rows)
    }

    /// Returns the names of all visible tables, sorted.
    #[must_use]
    pub fn list_tables(&self) -> Vec<String> {
        let Ok(inner) = self.inner.read() else {
            return Vec::new();
        };
        let mut names: Vec<String> = inner
            .by_name
            .iter()
            .filter(|(_, id)| inner.by_id.get(id).is_some_and(|e| e.is_visible()))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn ensure_name_free(&self, name: &str) -> Result<()> {
        let inner = self.read_registry()?;
        if inner.by_name.contains_key(name) {
            return Err(CatalogError::TableAlreadyExists {
                table: name.to_string(),
            });
        }
        Ok(())
    }

    fn insert(&self, entry: Arc<CatalogEntry>) -> Result<()> {
        let mut inner = self.write_registry()?;
        if inner.by_name.contains_key(entry.name()) {
            // Soft-dropped entries keep their name reserved for undrop.
            return Err(CatalogError::TableAlreadyExists {
                table: entry.name().to_string(),
            });
        }
        inner.by_name.insert(entry.name().to_string(), entry.id());
        inner.by_id.insert(entry.id(), entry);
        Ok(())
    }

    fn get_any(&self, name: &str) -> Result<Arc<CatalogEntry>> {
        let inner = self.read_registry()?;
        inner
            .by_name
            .get(name)
            .and_then(|id| inner.by_id.get(id))
            .cloned()
            .ok_or_else(|| CatalogError::TableNotFound {
                table: name.to_string(),
            })
    }

    /// Deletes every object under the entry's location, then removes the
    /// entry from the registry. Terminal: there is no undrop from here.
    async fn purge(&self, entry: &CatalogEntry) -> Result<()> {
        let prefix = entry.location().key_prefix();
        let objects = self.backend.list(&prefix).await?;
        for object in objects {
            self.backend.delete(&object.path).await?;
        }

        let mut inner = self.write_registry()?;
        inner.by_name.remove(entry.name());
        inner.by_id.remove(&entry.id());
        Ok(())
    }

    fn read_registry(&self) -> Result<std::sync::RwLockReadGuard<'_, Registry>> {
        self.inner.read().map_err(|_| {
            CatalogError::Storage(strata_core::Error::Internal {
                message: "registry lock poisoned".into(),
            })
        })
    }

    fn write_registry(&self) -> Result<std::sync::RwLockWriteGuard<'_, Registry>> {
        self.inner.write().map_err(|_| {
            CatalogError::Storage(strata_core::Error::Internal {
                message: "registry lock poisoned".into(),
            })
        })
    }
}

fn parse_location(
    uri: &str,
    connection: impl IntoIterator<Item = (String, String)>,
) -> Result<StorageLocation> {
    StorageLocation::parse(uri)
        .and_then(|loc| loc.with_connection(connection))
        .map_err(|e| CatalogError::InvalidLocation {
            message: e.to_string(),
        })
}

fn render_connection(location: &StorageLocation) -> String {
    if location.connection.is_empty() {
        return String::new();
    }
    let params: Vec<String> = location
        .connection
        .iter()
        .map(|(k, v)| format!("{k} = '{v}'"))
        .collect();
    format!(" CONNECTION = ({})", params.join(", "))
}
