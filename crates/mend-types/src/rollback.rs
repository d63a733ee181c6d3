//! Rollback record types
//!
//! A rollback references exactly one remediation or one snapshot, never
//! both; the target enum makes the alternative unrepresentable.

use crate::{RemediationId, RollbackId, SnapshotId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a rollback reverses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollbackTarget {
    /// Reverse the effect of a remediation
    Remediation(RemediationId),
    /// Restore a captured snapshot directly
    Snapshot(SnapshotId),
}

impl std::fmt::Display for RollbackTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RollbackTarget::Remediation(id) => write!(f, "{}", id),
            RollbackTarget::Snapshot(id) => write!(f, "{}", id),
        }
    }
}

/// Lifecycle status of a rollback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RollbackStatus {
    /// Created, reversal in progress
    Pending,

    /// The reversal took effect (terminal)
    Completed {
        /// When the reversal finished
        completed_at: DateTime<Utc>,
    },

    /// The reversal failed; left for manual intervention (terminal)
    Failed {
        /// Failure detail
        reason: String,
        /// When the reversal failed
        failed_at: DateTime<Utc>,
    },

    /// Auto-rollback was requested but policy disables it (terminal)
    Skipped {
        /// Why the rollback was skipped
        reason: String,
    },
}

impl RollbackStatus {
    /// Stable name for logging and statistics
    pub fn name(&self) -> &'static str {
        match self {
            RollbackStatus::Pending => "pending",
            RollbackStatus::Completed { .. } => "completed",
            RollbackStatus::Failed { .. } => "failed",
            RollbackStatus::Skipped { .. } => "skipped",
        }
    }

    /// Whether the rollback reached a final state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RollbackStatus::Pending)
    }

    /// Whether the reversal took effect
    pub fn is_completed(&self) -> bool {
        matches!(self, RollbackStatus::Completed { .. })
    }
}

impl std::fmt::Display for RollbackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Record of one rollback operation; immutable once terminal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackRecord {
    /// Unique id
    pub id: RollbackId,

    /// What was reversed
    pub target: RollbackTarget,

    /// Current status
    pub status: RollbackStatus,

    /// Why the rollback was requested
    pub reason: String,

    /// When the rollback was created
    pub created_at: DateTime<Utc>,
}

impl RollbackRecord {
    /// Create a new rollback record in `Pending`
    pub fn new(target: RollbackTarget, reason: impl Into<String>) -> Self {
        Self {
            id: RollbackId::generate(),
            target,
            status: RollbackStatus::Pending,
            reason: reason.into(),
            created_at: Utc::now(),
        }
    }

    /// The remediation this rollback reverses, when it targets one
    pub fn remediation_id(&self) -> Option<&RemediationId> {
        match &self.target {
            RollbackTarget::Remediation(id) => Some(id),
            RollbackTarget::Snapshot(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_exclusivity() {
        let rb = RollbackRecord::new(
            RollbackTarget::Remediation(RemediationId::generate()),
            "post-failure",
        );
        assert!(rb.remediation_id().is_some());

        let rb = RollbackRecord::new(RollbackTarget::Snapshot(SnapshotId::generate()), "manual");
        assert!(rb.remediation_id().is_none());
    }

    #[test]
    fn test_status_terminality() {
        assert!(!RollbackStatus::Pending.is_terminal());
        assert!(RollbackStatus::Completed { completed_at: Utc::now() }.is_terminal());
        assert!(RollbackStatus::Skipped { reason: "disabled".into() }.is_terminal());
    }
}
