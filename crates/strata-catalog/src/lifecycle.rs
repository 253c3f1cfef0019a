//! Soft-drop/undrop lifecycle transitions.
//!
//! The lifecycle manager governs the only mutable state a catalog entry
//! carries: its `Active`/`SoftDropped` flag. Transitions hold the entry's
//! lifecycle lock for the whole read-check-write, so concurrent transitions
//! on one table serialize to a definite outcome: the second caller observes
//! the first's result and fails with `AlreadyDropped`/`NotDropped`.
//!
//! Neither transition touches stored data or attachment metadata; a hard
//! purge is a registry-level removal and never reaches this module for
//! attached tables (the guard intercepts `DropAll` first).

use crate::error::{CatalogError, Result};
use crate::table::{CatalogEntry, LifecycleState};

/// A requested lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleTransition {
    /// Hide the table from ordinary queries, retaining all metadata.
    DropSoft,
    /// Restore a soft-dropped table to full visibility.
    Undrop,
}

/// Governs soft-drop/undrop state transitions.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleManager;

impl LifecycleManager {
    /// Applies `transition` to `entry`, returning the resulting state.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::AlreadyDropped`] for `DropSoft` on a dropped table.
    /// - [`CatalogError::NotDropped`] for `Undrop` on an active table.
    ///
    /// The entry's state is unchanged on failure.
    pub fn transition(
        entry: &CatalogEntry,
        transition: LifecycleTransition,
    ) -> Result<LifecycleState> {
        let mut state = entry.lifecycle_slot().lock().map_err(|_| {
            CatalogError::Storage(strata_core::Error::Internal {
                message: "lifecycle lock poisoned".into(),
            })
        })?;

        match (transition, *state) {
            (LifecycleTransition::DropSoft, LifecycleState::Active) => {
                *state = LifecycleState::SoftDropped;
                tracing::info!(table = entry.name(), "table soft-dropped");
                Ok(LifecycleState::SoftDropped)
            }
            (LifecycleTransition::DropSoft, LifecycleState::SoftDropped) => {
                Err(CatalogError::AlreadyDropped {
                    table: entry.name().to_string(),
                })
            }
            (LifecycleTransition::Undrop, LifecycleState::SoftDropped) => {
                *state = LifecycleState::Active;
                tracing::info!(table = entry.name(), "table restored");
                Ok(LifecycleState::Active)
            }
            (LifecycleTransition::Undrop, LifecycleState::Active) => {
                Err(CatalogError::NotDropped {
                    table: entry.name().to_string(),
                })
            }
        }
    }
}
