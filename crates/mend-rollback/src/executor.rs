//! Rollback executor seam
//!
//! The executor is the collaborator that performs the physical reversal:
//! pushing a snapshot's state back onto the resource, or running the
//! inverse of a completed action.

use async_trait::async_trait;
use mend_types::{RemediationRecord, Snapshot};
use tracing::debug;

/// Performs the physical reversal of a change
#[async_trait]
pub trait RollbackExecutor: Send + Sync {
    /// Restore a captured snapshot onto its resource
    async fn restore_snapshot(&self, snapshot: &Snapshot) -> std::result::Result<(), String>;

    /// Invoke the inverse of the remediation's action
    async fn invert(&self, record: &RemediationRecord) -> std::result::Result<(), String>;
}

/// No-op rollback executor for testing and development
pub struct NoOpRollbackExecutor;

#[async_trait]
impl RollbackExecutor for NoOpRollbackExecutor {
    async fn restore_snapshot(&self, snapshot: &Snapshot) -> std::result::Result<(), String> {
        debug!(snapshot_id = %snapshot.id, "no-op restoring snapshot");
        Ok(())
    }

    async fn invert(&self, record: &RemediationRecord) -> std::result::Result<(), String> {
        debug!(remediation_id = %record.id, action = %record.request.action, "no-op inverting action");
        Ok(())
    }
}

/// Rollback executor that always fails, for testing
pub struct FailingRollbackExecutor;

#[async_trait]
impl RollbackExecutor for FailingRollbackExecutor {
    async fn restore_snapshot(&self, _snapshot: &Snapshot) -> std::result::Result<(), String> {
        Err("simulated restore failure".to_string())
    }

    async fn invert(&self, _record: &RemediationRecord) -> std::result::Result<(), String> {
        Err("simulated inverse-action failure".to_string())
    }
}
