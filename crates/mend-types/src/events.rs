//! Event types for MEND observability
//!
//! Events provide a unified stream of remediation lifecycle activities.

use crate::{ActionKind, RemediationId, RollbackId, SnapshotId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all MEND events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MendEventEnvelope {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Event source
    pub source: EventSource,

    /// Event severity
    pub severity: EventSeverity,

    /// The actual event
    pub event: MendEvent,
}

impl MendEventEnvelope {
    /// Wrap an event with a fresh id and timestamp
    pub fn new(event: MendEvent, source: EventSource, severity: EventSeverity) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            source,
            severity,
            event,
        }
    }
}

/// Event sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSource {
    /// Remediation orchestrator
    Orchestrator,
    /// Rollback manager
    Rollback,
    /// Snapshot store
    Snapshot,
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Informational event
    Info,
    /// Warning event
    Warning,
    /// Error event
    Error,
}

/// MEND events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MendEvent {
    /// A request passed validation and a record was created
    RemediationSubmitted {
        remediation_id: RemediationId,
        action: ActionKind,
        requested_by: String,
    },

    /// The policy allow-list rejected the action
    RemediationRejectedByPolicy {
        remediation_id: RemediationId,
        action: ActionKind,
        reason: String,
    },

    /// The record parked until approval
    RemediationAwaitingApproval {
        remediation_id: RemediationId,
        action: ActionKind,
    },

    /// An approver released the record
    RemediationApproved {
        remediation_id: RemediationId,
        approved_by: String,
    },

    /// An approver rejected the record
    RemediationRejected {
        remediation_id: RemediationId,
        rejected_by: String,
        reason: String,
    },

    /// One executor attempt failed
    AttemptFailed {
        remediation_id: RemediationId,
        attempt: u32,
        error: String,
    },

    /// An attempt succeeded and the record completed
    RemediationCompleted {
        remediation_id: RemediationId,
        attempts: u32,
    },

    /// Every attempt failed
    RemediationFailed {
        remediation_id: RemediationId,
        attempts: u32,
        reason: String,
    },

    /// An automatic rollback reversed the failed remediation
    RemediationRolledBack {
        remediation_id: RemediationId,
        rollback_id: RollbackId,
    },

    /// A rollback started
    RollbackStarted {
        rollback_id: RollbackId,
        reason: String,
    },

    /// A rollback completed
    RollbackCompleted {
        rollback_id: RollbackId,
    },

    /// A rollback failed and is left for manual intervention
    RollbackFailed {
        rollback_id: RollbackId,
        reason: String,
    },

    /// A snapshot was captured
    SnapshotCaptured {
        snapshot_id: SnapshotId,
        resource_uri: String,
    },

    /// The retention sweep removed expired snapshots
    SnapshotsSwept {
        removed: usize,
    },
}
