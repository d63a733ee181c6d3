//! Rollback error types

use mend_types::{RemediationId, SnapshotId};
use thiserror::Error;

/// Rollback errors
#[derive(Debug, Error)]
pub enum RollbackError {
    #[error("remediation not found: {0}")]
    RemediationNotFound(RemediationId),

    #[error("snapshot not found: {0}")]
    SnapshotNotFound(SnapshotId),

    #[error("remediation {id} is {status}; rollback requires a completed or failed record unless forced")]
    InvalidState { id: RemediationId, status: String },

    #[error("ledger error: {0}")]
    Ledger(#[from] mend_ledger::LedgerError),

    #[error("snapshot store error: {0}")]
    Snapshot(#[from] mend_snapshot::SnapshotError),
}

/// Result type for rollback operations
pub type Result<T> = std::result::Result<T, RollbackError>;
