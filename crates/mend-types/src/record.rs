//! Remediation request and lifecycle record types
//!
//! A `RemediationRecord` tracks one submitted request from creation to a
//! terminal state. Status transitions are monotonic; the only mutation
//! allowed after a terminal status is attaching a rollback cross-reference.

use crate::{ActionKind, Arguments, RemediationId, RollbackId, SnapshotId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable input describing what a caller wants remediated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationRequest {
    /// The catalog action to perform
    pub action: ActionKind,

    /// Named arguments, validated against the action's spec
    pub arguments: Arguments,

    /// Established identity of the caller
    pub requested_by: String,

    /// Why the remediation is needed (required for audit)
    pub reason: String,
}

impl RemediationRequest {
    /// Build a request
    pub fn new(
        action: ActionKind,
        arguments: Arguments,
        requested_by: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            action,
            arguments,
            requested_by: requested_by.into(),
            reason: reason.into(),
        }
    }
}

/// Lifecycle status of a remediation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RemediationStatus {
    /// Created, not yet gated or executed
    Pending,

    /// The policy allow-list excluded this action (terminal)
    RejectedByPolicy {
        /// Policy violation detail
        reason: String,
    },

    /// Parked until an approver decides
    AwaitingApproval,

    /// An approver released the record for execution
    Approved {
        /// Who approved
        approved_by: String,
        /// When approval was granted
        approved_at: DateTime<Utc>,
    },

    /// The action executor is being invoked
    Executing,

    /// An attempt succeeded (terminal)
    Completed {
        /// When the winning attempt finished
        completed_at: DateTime<Utc>,
    },

    /// Every attempt failed (terminal unless auto-rollback fires)
    Failed {
        /// Last failure detail
        reason: String,
        /// When the final attempt failed
        failed_at: DateTime<Utc>,
        /// Set when an automatic rollback was attempted and itself failed
        rollback_failure: Option<String>,
    },

    /// A rollback reversed this remediation (terminal)
    RolledBack {
        /// The rollback that reversed it
        rollback_id: RollbackId,
        /// When the rollback completed
        rolled_back_at: DateTime<Utc>,
    },

    /// An approver rejected the record (terminal)
    RejectedByCaller {
        /// Who rejected
        rejected_by: String,
        /// Why it was rejected
        reason: String,
        /// When it was rejected
        rejected_at: DateTime<Utc>,
    },
}

impl RemediationStatus {
    /// Stable name for logging and statistics
    pub fn name(&self) -> &'static str {
        match self {
            RemediationStatus::Pending => "pending",
            RemediationStatus::RejectedByPolicy { .. } => "rejected_by_policy",
            RemediationStatus::AwaitingApproval => "awaiting_approval",
            RemediationStatus::Approved { .. } => "approved",
            RemediationStatus::Executing => "executing",
            RemediationStatus::Completed { .. } => "completed",
            RemediationStatus::Failed { .. } => "failed",
            RemediationStatus::RolledBack { .. } => "rolled_back",
            RemediationStatus::RejectedByCaller { .. } => "rejected_by_caller",
        }
    }

    /// Whether no further transition may occur (except rollback cross-linking)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RemediationStatus::RejectedByPolicy { .. }
                | RemediationStatus::Completed { .. }
                | RemediationStatus::Failed { .. }
                | RemediationStatus::RolledBack { .. }
                | RemediationStatus::RejectedByCaller { .. }
        )
    }

    /// The monotonic transition table.
    ///
    /// `Failed -> RolledBack` is the one transition out of an otherwise
    /// terminal state, taken when auto-rollback succeeds.
    pub fn can_transition_to(&self, next: &RemediationStatus) -> bool {
        use RemediationStatus::*;
        match (self, next) {
            (Pending, RejectedByPolicy { .. }) => true,
            (Pending, AwaitingApproval) => true,
            (Pending, Executing) => true,
            (AwaitingApproval, Approved { .. }) => true,
            (AwaitingApproval, RejectedByCaller { .. }) => true,
            (Approved { .. }, Executing) => true,
            (Executing, Completed { .. }) => true,
            (Executing, Failed { .. }) => true,
            (Failed { .. }, Failed { .. }) => true,
            (Failed { .. }, RolledBack { .. }) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for RemediationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What a single executor attempt produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// The executor reported success
    Succeeded,
    /// The executor reported failure
    Failed {
        /// Executor-reported error detail
        error: String,
    },
    /// The attempt exceeded the per-attempt timeout
    TimedOut,
}

impl AttemptOutcome {
    /// Whether the attempt succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Succeeded)
    }

    /// Failure detail, when there is one
    pub fn error(&self) -> Option<&str> {
        match self {
            AttemptOutcome::Succeeded => None,
            AttemptOutcome::Failed { error } => Some(error),
            AttemptOutcome::TimedOut => Some("attempt timed out"),
        }
    }
}

/// One executor invocation within a remediation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based attempt number
    pub attempt: u32,

    /// When the attempt started
    pub started_at: DateTime<Utc>,

    /// How long the attempt took, in milliseconds
    pub duration_ms: u64,

    /// What happened
    pub outcome: AttemptOutcome,
}

/// Structured result reported by the executor on success
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Whether the action took effect
    pub success: bool,

    /// Human-readable summary
    pub message: String,

    /// Measured details (instances affected, durations, capacities)
    pub detail: serde_json::Value,
}

impl ExecutionOutcome {
    /// A successful outcome with detail payload
    pub fn success(message: impl Into<String>, detail: serde_json::Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            detail,
        }
    }
}

/// Full lifecycle record of one submitted remediation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationRecord {
    /// Unique id
    pub id: RemediationId,

    /// The request as submitted
    pub request: RemediationRequest,

    /// Current lifecycle status
    pub status: RemediationStatus,

    /// Every executor attempt, in order
    pub attempts: Vec<AttemptRecord>,

    /// Final structured outcome once terminal
    pub result: Option<ExecutionOutcome>,

    /// Who approved, when approval was involved
    pub approved_by: Option<String>,

    /// Who rejected, when rejection was involved
    pub rejected_by: Option<String>,

    /// Snapshot captured before execution, when policy asked for one
    pub pre_snapshot_id: Option<SnapshotId>,

    /// Rollback cross-reference; the only post-terminal mutation
    pub rollback_id: Option<RollbackId>,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record last changed
    pub updated_at: DateTime<Utc>,

    /// When the record reached a terminal status
    pub terminal_at: Option<DateTime<Utc>>,
}

impl RemediationRecord {
    /// Create a new record in `Pending`
    pub fn new(request: RemediationRequest) -> Self {
        let now = Utc::now();
        Self {
            id: RemediationId::generate(),
            request,
            status: RemediationStatus::Pending,
            attempts: Vec::new(),
            result: None,
            approved_by: None,
            rejected_by: None,
            pre_snapshot_id: None,
            rollback_id: None,
            created_at: now,
            updated_at: now,
            terminal_at: None,
        }
    }

    /// Apply a status transition, stamping timestamps
    pub fn transition(&mut self, status: RemediationStatus) {
        let now = Utc::now();
        if status.is_terminal() {
            self.terminal_at = Some(now);
        }
        self.status = status;
        self.updated_at = now;
    }

    /// The resource this remediation targets, when its arguments name one
    pub fn resource_uri(&self) -> Option<&str> {
        crate::action::resource_argument(&self.request.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> RemediationRecord {
        let mut args = Arguments::new();
        args.insert("resource_uri".into(), json!("infra://aws/ec2/i-1"));
        RemediationRecord::new(RemediationRequest::new(
            ActionKind::RestartService,
            args,
            "operator-a",
            "oom loop",
        ))
    }

    #[test]
    fn test_new_record_is_pending() {
        let rec = record();
        assert!(matches!(rec.status, RemediationStatus::Pending));
        assert!(rec.terminal_at.is_none());
        assert!(rec.attempts.is_empty());
    }

    #[test]
    fn test_transition_stamps_terminal() {
        let mut rec = record();
        rec.transition(RemediationStatus::Executing);
        assert!(rec.terminal_at.is_none());
        rec.transition(RemediationStatus::Completed { completed_at: Utc::now() });
        assert!(rec.terminal_at.is_some());
    }

    #[test]
    fn test_transition_table_monotonic() {
        use RemediationStatus::*;
        let completed = Completed { completed_at: Utc::now() };
        let failed = Failed {
            reason: "boom".into(),
            failed_at: Utc::now(),
            rollback_failure: None,
        };

        assert!(Pending.can_transition_to(&AwaitingApproval));
        assert!(AwaitingApproval.can_transition_to(&RejectedByCaller {
            rejected_by: "opA".into(),
            reason: "too risky".into(),
            rejected_at: Utc::now(),
        }));
        assert!(Executing.can_transition_to(&completed));
        assert!(failed.can_transition_to(&RolledBack {
            rollback_id: RollbackId::generate(),
            rolled_back_at: Utc::now(),
        }));

        // no backward transitions
        assert!(!completed.can_transition_to(&Executing));
        assert!(!completed.can_transition_to(&Pending));
        assert!(!AwaitingApproval.can_transition_to(&Pending));
    }

    #[test]
    fn test_resource_uri_lookup() {
        let rec = record();
        assert_eq!(rec.resource_uri(), Some("infra://aws/ec2/i-1"));
    }
}
