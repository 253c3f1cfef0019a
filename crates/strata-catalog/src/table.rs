//! Table descriptors: identity, location, mutability tier, lifecycle flag.
//!
//! A [`CatalogEntry`] is the durable descriptor for one catalog table. It
//! composes the other components but mutates none of their state directly:
//! guard checks go through [`CatalogEntry::check`], lifecycle transitions
//! through [`CatalogEntry::apply_lifecycle`], and snapshot resolution through
//! [`CatalogEntry::resolve_current_snapshot`].
//!
//! The lifecycle flag is the only mutable state an entry carries. Everything
//! else (identity, location, tier, connection parameters) is fixed at
//! creation, which is what makes drop-then-undrop restore the exact
//! pre-drop queryable state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use strata_core::{StorageLocation, TableId};

use crate::error::{CatalogError, Result};
use crate::guard::MutabilityGuard;
use crate::lifecycle::{LifecycleManager, LifecycleTransition};
use crate::manifest::SnapshotPointer;
use crate::operation::MutationRequest;
use crate::resolver::AttachmentResolver;

/// Mutability tier of a table.
///
/// The tier is fixed at creation time: no operation promotes a
/// `ReadOnlyAttached` table to `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutabilityTier {
    /// Ordinary table; all operations admitted (subject to external checks).
    Normal,
    /// Read-only alias over another table's storage location. The data at the
    /// location belongs to the owner table; this table never commits.
    ReadOnlyAttached,
}

/// Lifecycle state of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleState {
    /// Visible to ordinary queries.
    Active,
    /// Hidden from ordinary queries; all metadata retained.
    SoftDropped,
}

/// Durable descriptor for one catalog table.
#[derive(Debug)]
pub struct CatalogEntry {
    id: TableId,
    name: String,
    location: StorageLocation,
    tier: MutabilityTier,
    created_at: DateTime<Utc>,
    lifecycle: Mutex<LifecycleState>,
}

impl CatalogEntry {
    /// Creates an active entry with a freshly generated ID.
    #[must_use]
    pub fn new(name: impl Into<String>, location: StorageLocation, tier: MutabilityTier) -> Self {
        Self {
            id: TableId::generate(),
            name: name.into(),
            location,
            tier,
            created_at: Utc::now(),
            lifecycle: Mutex::new(LifecycleState::Active),
        }
    }

    /// Returns the stable table identity.
    #[must_use]
    pub const fn id(&self) -> TableId {
        self.id
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the storage location this entry is bound to.
    #[must_use]
    pub const fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Returns the mutability tier.
    #[must_use]
    pub const fn tier(&self) -> MutabilityTier {
        self.tier
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the current lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the lifecycle lock is poisoned.
    pub fn lifecycle_state(&self) -> Result<LifecycleState> {
        Ok(*self.lifecycle.lock().map_err(|_| {
            CatalogError::Storage(strata_core::Error::Internal {
                message: "lifecycle lock poisoned".into(),
            })
        })?)
    }

    /// Returns whether this entry is visible to ordinary queries.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        matches!(self.lifecycle_state(), Ok(LifecycleState::Active))
    }

    /// Checks an operation against this table's mutability tier.
    ///
    /// Runs strictly before any storage interaction; rejection guarantees no
    /// partial side effects occurred.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ReadOnlyViolation`] when a mutating operation
    /// targets a read-only attached table.
    pub fn check(&self, request: &MutationRequest) -> Result<()> {
        MutabilityGuard::check(request, self.tier)
    }

    /// Applies a lifecycle transition, returning the resulting state.
    ///
    /// Transitions on one entry are mutually exclusive: concurrent calls
    /// serialize, and the loser observes the winner's state.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::AlreadyDropped`] or [`CatalogError::NotDropped`]
    /// when the transition does not apply to the current state.
    pub fn apply_lifecycle(&self, transition: LifecycleTransition) -> Result<LifecycleState> {
        LifecycleManager::transition(self, transition)
    }

    /// Resolves the current snapshot pointer for this table's location.
    ///
    /// Delegates to the resolver; the pointer is re-resolved on every call and
    /// never cached, so the result is never staler than the call itself.
    ///
    /// # Errors
    ///
    /// Returns a resolution error if the manifest is missing, unreadable, or
    /// the endpoint cannot be reached.
    pub async fn resolve_current_snapshot(
        &self,
        resolver: &AttachmentResolver,
    ) -> Result<SnapshotPointer> {
        resolver.resolve(&self.name, &self.location).await
    }

    pub(crate) fn lifecycle_slot(&self) -> &Mutex<LifecycleState> {
        &self.lifecycle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationKind;

    fn entry(tier: MutabilityTier) -> CatalogEntry {
        let location = StorageLocation::parse("memory://lake/orders").expect("valid");
        CatalogEntry::new("orders", location, tier)
    }

    #[test]
    fn test_new_entry_is_active() {
        let entry = entry(MutabilityTier::Normal);
        assert_eq!(entry.lifecycle_state().unwrap(), LifecycleState::Active);
        assert!(entry.is_visible());
    }

    #[test]
    fn test_check_delegates_to_guard() {
        let attached = entry(MutabilityTier::ReadOnlyAttached);
        let request = MutationRequest::new(OperationKind::Delete, "orders");
        assert!(matches!(
            attached.check(&request),
            Err(CatalogError::ReadOnlyViolation { .. })
        ));

        let normal = entry(MutabilityTier::Normal);
        assert!(normal.check(&request).is_ok());
    }

    #[test]
    fn test_metadata_is_fixed_across_lifecycle() {
        let entry = entry(MutabilityTier::ReadOnlyAttached);
        let id = entry.id();
        let uri = entry.location().uri();

        entry
            .apply_lifecycle(LifecycleTransition::DropSoft)
            .expect("drop");
        entry
            .apply_lifecycle(LifecycleTransition::Undrop)
            .expect("undrop");

        assert_eq!(entry.id(), id);
        assert_eq!(entry.location().uri(), uri);
        assert_eq!(entry.tier(), MutabilityTier::ReadOnlyAttached);
    }
}
