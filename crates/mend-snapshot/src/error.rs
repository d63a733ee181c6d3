//! Snapshot error types

use mend_types::SnapshotId;
use thiserror::Error;

/// Snapshot errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot not found: {0}")]
    NotFound(SnapshotId),

    #[error("state capture failed for {resource_uri}: {reason}")]
    CaptureFailed {
        resource_uri: String,
        reason: String,
    },

    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for snapshot operations
pub type Result<T> = std::result::Result<T, SnapshotError>;
