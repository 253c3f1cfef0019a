//! Mutability enforcement for catalog tables.
//!
//! The guard decides admit-or-reject for every operation before any execution
//! proceeds. The decision is a pure function of the operation's class and the
//! table's tier:
//!
//! | class \ tier | Normal | ReadOnlyAttached |
//! |--------------|--------|------------------|
//! | Read         | admit  | admit            |
//! | Mutating     | admit  | reject           |
//! | Lifecycle    | admit  | admit            |
//!
//! Lifecycle operations are admitted regardless of tier because they only
//! toggle the catalog flag and never touch stored data. Rejection happens
//! strictly before any storage interaction, so a rejected request has no
//! partial side effects to undo.

use crate::error::{CatalogError, Result};
use crate::metrics;
use crate::operation::{MutationRequest, OperationClass};
use crate::table::MutabilityTier;

/// Classifies operations and enforces the read-only policy.
#[derive(Debug, Clone, Copy)]
pub struct MutabilityGuard;

impl MutabilityGuard {
    /// Decides whether the request is admissible for a table of this tier.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ReadOnlyViolation`] for a mutating operation
    /// against a `ReadOnlyAttached` table. Admission for `Normal`-tier tables
    /// is still subject to external collaborator checks (privileges).
    pub fn check(request: &MutationRequest, tier: MutabilityTier) -> Result<()> {
        match request.kind.class() {
            OperationClass::Read | OperationClass::Lifecycle => Ok(()),
            OperationClass::Mutating => match tier {
                MutabilityTier::Normal => Ok(()),
                MutabilityTier::ReadOnlyAttached => {
                    tracing::warn!(
                        table = %request.table,
                        operation = %request.kind,
                        "rejected mutating operation on read-only attached table"
                    );
                    metrics::record_readonly_rejection(request.kind);
                    Err(CatalogError::ReadOnlyViolation {
                        operation: request.kind,
                        table: request.table.clone(),
                    })
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationKind;

    fn check(kind: OperationKind, tier: MutabilityTier) -> Result<()> {
        MutabilityGuard::check(&MutationRequest::new(kind, "orders"), tier)
    }

    #[test]
    fn test_normal_tier_admits_everything() {
        for kind in OperationKind::ALL {
            assert!(
                check(kind, MutabilityTier::Normal).is_ok(),
                "{kind} should be admitted for Normal tier"
            );
        }
    }

    #[test]
    fn test_attached_tier_rejects_every_mutating_kind() {
        for kind in OperationKind::ALL {
            let result = check(kind, MutabilityTier::ReadOnlyAttached);
            match kind.class() {
                OperationClass::Mutating => {
                    let err = result.expect_err("mutating kinds must be rejected");
                    match err {
                        CatalogError::ReadOnlyViolation { operation, table } => {
                            assert_eq!(operation, kind);
                            assert_eq!(table, "orders");
                        }
                        other => panic!("expected ReadOnlyViolation, got {other}"),
                    }
                }
                OperationClass::Read | OperationClass::Lifecycle => {
                    assert!(result.is_ok(), "{kind} should be admitted");
                }
            }
        }
    }

    #[test]
    fn test_drop_all_rejected_on_attached() {
        // Hard purge would destroy data the attachment does not own.
        assert!(matches!(
            check(OperationKind::DropAll, MutabilityTier::ReadOnlyAttached),
            Err(CatalogError::ReadOnlyViolation { .. })
        ));
    }

    #[test]
    fn test_lifecycle_admitted_on_attached() {
        assert!(check(OperationKind::DropSoft, MutabilityTier::ReadOnlyAttached).is_ok());
        assert!(check(OperationKind::Undrop, MutabilityTier::ReadOnlyAttached).is_ok());
    }
}
