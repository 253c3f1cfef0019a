//! Catalog metrics.
//!
//! Counters for guard rejections, snapshot resolutions, and CAS retries.
//! These complement the structured logging already in place.

use metrics::{counter, describe_counter};

use crate::operation::OperationKind;

/// Read-only rejection counter.
pub const READONLY_REJECTED: &str = "strata_readonly_rejected_total";

/// Snapshot resolution counter.
pub const SNAPSHOT_RESOLUTIONS: &str = "strata_snapshot_resolutions_total";

/// CAS retry counter.
pub const CAS_RETRY: &str = "strata_cas_retry_total";

/// Registers all catalog metric descriptions.
///
/// Call once at application startup after initializing the metrics recorder.
pub fn register_metrics() {
    describe_counter!(
        READONLY_REJECTED,
        "Total mutating operations rejected on read-only attached tables"
    );
    describe_counter!(SNAPSHOT_RESOLUTIONS, "Total snapshot pointer resolutions");
    describe_counter!(CAS_RETRY, "Total CAS retry attempts");
}

/// Records a guard rejection of a mutating operation.
pub fn record_readonly_rejection(operation: OperationKind) {
    counter!(READONLY_REJECTED, "operation" => operation.statement()).increment(1);
}

/// Records a snapshot pointer resolution.
pub fn record_resolution() {
    counter!(SNAPSHOT_RESOLUTIONS).increment(1);
}

/// Records a CAS retry attempt.
pub fn record_cas_retry(operation: &'static str) {
    counter!(CAS_RETRY, "operation" => operation).increment(1);
}
