//! The remediation state machine
//!
//! One record moves `pending -> (rejected_by_policy | awaiting_approval ->
//! approved | rejected_by_caller) -> executing -> completed | failed ->
//! rolled_back`. Transitions are monotonic, serialized per id, and written
//! to the ledger before the in-memory record is updated: a ledger failure
//! aborts the transition and the two stores never diverge.

use crate::error::{OrchestratorError, Result};
use crate::executor::{ActionExecutor, ExecutorError};
use chrono::Utc;
use dashmap::DashMap;
use mend_ledger::Ledger;
use mend_registry::ActionRegistry;
use mend_rollback::RollbackManager;
use mend_snapshot::SnapshotStore;
use mend_types::{
    ActionSpec, AttemptOutcome, AttemptRecord, EventSeverity, EventSource, MendEvent,
    MendEventEnvelope, RemediationId, RemediationPolicy, RemediationRecord, RemediationRequest,
    RemediationStatus, RollbackRecord, RollbackStatus, SnapshotTrigger,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, instrument, warn};

/// Drives remediation records through their lifecycle
pub struct RemediationOrchestrator {
    /// Action catalog
    registry: Arc<ActionRegistry>,
    /// Governance policy, read-only after startup
    policy: RemediationPolicy,
    /// Performs the physical side effects
    executor: Arc<dyn ActionExecutor>,
    /// Durable history; written before every in-memory update
    ledger: Arc<dyn Ledger>,
    /// Pre-change snapshots for risky actions
    snapshots: Arc<SnapshotStore>,
    /// Reverses failed remediations per policy
    rollback: Arc<RollbackManager>,
    /// Authoritative in-memory records
    records: DashMap<RemediationId, RemediationRecord>,
    /// Per-id transition locks
    locks: DashMap<RemediationId, Arc<Mutex<()>>>,
    /// Event channel
    event_tx: broadcast::Sender<MendEventEnvelope>,
}

impl RemediationOrchestrator {
    /// Create a new orchestrator
    pub fn new(
        registry: Arc<ActionRegistry>,
        policy: RemediationPolicy,
        executor: Arc<dyn ActionExecutor>,
        ledger: Arc<dyn Ledger>,
        snapshots: Arc<SnapshotStore>,
        rollback: Arc<RollbackManager>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(4096);
        Self {
            registry,
            policy,
            executor,
            ledger,
            snapshots,
            rollback,
            records: DashMap::new(),
            locks: DashMap::new(),
            event_tx,
        }
    }

    /// Use an external event channel instead of a private one
    pub fn with_event_sender(mut self, event_tx: broadcast::Sender<MendEventEnvelope>) -> Self {
        self.event_tx = event_tx;
        self
    }

    /// Submit a remediation request.
    ///
    /// Validation failures surface immediately and create no record. A
    /// policy-disallowed action creates a record directly in
    /// `rejected_by_policy` and returns without executing. Otherwise the
    /// record either parks in `awaiting_approval` or is executed in place.
    #[instrument(skip(self, request), fields(action = %request.action, requested_by = %request.requested_by))]
    pub async fn submit(&self, request: RemediationRequest) -> Result<RemediationRecord> {
        // 1-2. Resolve and validate before any state exists.
        let spec = self.registry.validate(request.action, &request.arguments)?;

        // 3. Policy allow-list.
        if !self.policy.is_action_allowed(request.action) {
            let mut record = RemediationRecord::new(request);
            let reason = format!(
                "action '{}' is not in the allowed actions list",
                record.request.action
            );
            record.transition(RemediationStatus::RejectedByPolicy {
                reason: reason.clone(),
            });
            self.commit(&record).await?;

            warn!(remediation_id = %record.id, %reason, "remediation rejected by policy");
            self.emit(
                MendEvent::RemediationRejectedByPolicy {
                    remediation_id: record.id.clone(),
                    action: record.request.action,
                    reason,
                },
                EventSeverity::Warning,
            );
            return Ok(record);
        }

        // 4. Create the record.
        let mut record = RemediationRecord::new(request);
        self.commit(&record).await?;
        info!(remediation_id = %record.id, "remediation submitted");
        self.emit(
            MendEvent::RemediationSubmitted {
                remediation_id: record.id.clone(),
                action: record.request.action,
                requested_by: record.request.requested_by.clone(),
            },
            EventSeverity::Info,
        );

        // 5. Approval gate.
        if self.policy.require_approval {
            record.transition(RemediationStatus::AwaitingApproval);
            self.commit(&record).await?;
            info!(remediation_id = %record.id, "remediation awaiting approval");
            self.emit(
                MendEvent::RemediationAwaitingApproval {
                    remediation_id: record.id.clone(),
                    action: record.request.action,
                },
                EventSeverity::Info,
            );
            return Ok(record);
        }

        // 6-9. Execute with retries, then rollback on failure per policy.
        self.execute_record(record, &spec).await
    }

    /// Approve a parked record and run it.
    ///
    /// Valid only from `awaiting_approval`; the per-id lock guarantees an
    /// approve/reject race resolves to exactly one winner.
    #[instrument(skip(self), fields(remediation_id = %id, approver = approver))]
    pub async fn approve(&self, id: &RemediationId, approver: &str) -> Result<RemediationRecord> {
        let record = {
            let lock = self.lock_for(id);
            let _guard = lock.lock().await;

            let mut record = self
                .records
                .get(id)
                .map(|r| r.clone())
                .ok_or_else(|| OrchestratorError::NotFound(id.clone()))?;

            if !matches!(record.status, RemediationStatus::AwaitingApproval) {
                return Err(OrchestratorError::InvalidState {
                    current: record.status.name().to_string(),
                    expected: vec!["awaiting_approval".to_string()],
                });
            }

            record.approved_by = Some(approver.to_string());
            record.transition(RemediationStatus::Approved {
                approved_by: approver.to_string(),
                approved_at: Utc::now(),
            });
            self.commit(&record).await?;
            record
        };

        info!(remediation_id = %id, approver, "remediation approved");
        self.emit(
            MendEvent::RemediationApproved {
                remediation_id: id.clone(),
                approved_by: approver.to_string(),
            },
            EventSeverity::Info,
        );

        // Execution runs outside the guard; the status gate above keeps any
        // concurrent approve or reject out.
        let spec = self
            .registry
            .resolve(record.request.action)
            .ok_or_else(|| {
                OrchestratorError::UnknownAction(record.request.action.name().to_string())
            })?;
        self.execute_record(record, &spec).await
    }

    /// Reject a parked record.
    ///
    /// Valid only from `awaiting_approval`.
    #[instrument(skip(self, reason), fields(remediation_id = %id, rejector = rejector))]
    pub async fn reject(
        &self,
        id: &RemediationId,
        rejector: &str,
        reason: &str,
    ) -> Result<RemediationRecord> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let mut record = self
            .records
            .get(id)
            .map(|r| r.clone())
            .ok_or_else(|| OrchestratorError::NotFound(id.clone()))?;

        if !matches!(record.status, RemediationStatus::AwaitingApproval) {
            return Err(OrchestratorError::InvalidState {
                current: record.status.name().to_string(),
                expected: vec!["awaiting_approval".to_string()],
            });
        }

        record.rejected_by = Some(rejector.to_string());
        record.transition(RemediationStatus::RejectedByCaller {
            rejected_by: rejector.to_string(),
            reason: reason.to_string(),
            rejected_at: Utc::now(),
        });
        self.commit(&record).await?;

        info!(remediation_id = %id, rejector, "remediation rejected");
        self.emit(
            MendEvent::RemediationRejected {
                remediation_id: id.clone(),
                rejected_by: rejector.to_string(),
                reason: reason.to_string(),
            },
            EventSeverity::Warning,
        );
        Ok(record)
    }

    /// Read a record
    pub async fn get(&self, id: &RemediationId) -> Result<RemediationRecord> {
        self.records
            .get(id)
            .map(|r| r.clone())
            .ok_or_else(|| OrchestratorError::NotFound(id.clone()))
    }

    /// List records, newest first
    pub async fn list(
        &self,
        limit: usize,
        cursor: Option<&RemediationId>,
    ) -> Result<Vec<RemediationRecord>> {
        self.ledger
            .list_remediations(limit, cursor)
            .await
            .map_err(|e| OrchestratorError::Persistence(e.to_string()))
    }

    /// Attach a rollback cross-reference to a record.
    ///
    /// The one mutation allowed after a terminal status. Called by the
    /// service facade when a manual rollback targets this record.
    pub async fn link_rollback(
        &self,
        id: &RemediationId,
        rollback: &RollbackRecord,
    ) -> Result<RemediationRecord> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let mut record = self
            .records
            .get(id)
            .map(|r| r.clone())
            .ok_or_else(|| OrchestratorError::NotFound(id.clone()))?;

        record.rollback_id = Some(rollback.id.clone());
        record.updated_at = Utc::now();
        self.commit(&record).await?;
        Ok(record)
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<MendEventEnvelope> {
        self.event_tx.subscribe()
    }

    /// The governing policy
    pub fn policy(&self) -> &RemediationPolicy {
        &self.policy
    }

    // --- Internal helpers ---

    /// Run the attempt loop for a record that passed every gate.
    async fn execute_record(
        &self,
        mut record: RemediationRecord,
        spec: &ActionSpec,
    ) -> Result<RemediationRecord> {
        // Pre-change snapshot for risky tiers. Best effort: a provider
        // hiccup must not block the remediation itself.
        if self.policy.wants_snapshot(spec.risk) {
            if let Some(resource_uri) = record.resource_uri().map(str::to_string) {
                match self
                    .snapshots
                    .capture(
                        &resource_uri,
                        format!("before {}", record.request.action),
                        SnapshotTrigger::PreRemediation,
                    )
                    .await
                {
                    Ok(snapshot) => record.pre_snapshot_id = Some(snapshot.id),
                    Err(e) => {
                        warn!(remediation_id = %record.id, error = %e, "pre-change snapshot failed")
                    }
                }
            }
        }

        record.transition(RemediationStatus::Executing);
        self.commit(&record).await?;

        let max_attempts = self.policy.max_attempts();
        let mut last_error = String::from("no attempts were made");

        for attempt in 1..=max_attempts {
            let started_at = Utc::now();
            let started = Instant::now();

            let result = tokio::time::timeout(
                self.policy.execution_timeout,
                self.executor
                    .execute(record.request.action, &record.request.arguments),
            )
            .await;

            let duration_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(Ok(outcome)) => {
                    record.attempts.push(AttemptRecord {
                        attempt,
                        started_at,
                        duration_ms,
                        outcome: AttemptOutcome::Succeeded,
                    });
                    record.result = Some(outcome);
                    record.transition(RemediationStatus::Completed {
                        completed_at: Utc::now(),
                    });
                    self.commit(&record).await?;

                    info!(remediation_id = %record.id, attempts = attempt, "remediation completed");
                    self.emit(
                        MendEvent::RemediationCompleted {
                            remediation_id: record.id.clone(),
                            attempts: attempt,
                        },
                        EventSeverity::Info,
                    );
                    return Ok(record);
                }
                Ok(Err(ExecutorError::Failed(error))) => {
                    last_error = error;
                    record.attempts.push(AttemptRecord {
                        attempt,
                        started_at,
                        duration_ms,
                        outcome: AttemptOutcome::Failed {
                            error: last_error.clone(),
                        },
                    });
                }
                Err(_elapsed) => {
                    last_error = format!(
                        "attempt timed out after {:?}",
                        self.policy.execution_timeout
                    );
                    record.attempts.push(AttemptRecord {
                        attempt,
                        started_at,
                        duration_ms,
                        outcome: AttemptOutcome::TimedOut,
                    });
                }
            }

            // Persist the appended attempt before any backoff.
            self.commit(&record).await?;
            warn!(remediation_id = %record.id, attempt, error = %last_error, "remediation attempt failed");
            self.emit(
                MendEvent::AttemptFailed {
                    remediation_id: record.id.clone(),
                    attempt,
                    error: last_error.clone(),
                },
                EventSeverity::Warning,
            );

            if attempt < max_attempts {
                tokio::time::sleep(self.policy.retry_backoff).await;
            }
        }

        // Every attempt failed.
        record.transition(RemediationStatus::Failed {
            reason: last_error.clone(),
            failed_at: Utc::now(),
            rollback_failure: None,
        });
        self.commit(&record).await?;

        warn!(remediation_id = %record.id, attempts = max_attempts, "remediation failed");
        self.emit(
            MendEvent::RemediationFailed {
                remediation_id: record.id.clone(),
                attempts: max_attempts,
                reason: last_error.clone(),
            },
            EventSeverity::Error,
        );

        self.try_auto_rollback(record, &last_error).await
    }

    /// Hand a failed record to the rollback manager and fold the outcome
    /// back into the record.
    async fn try_auto_rollback(
        &self,
        mut record: RemediationRecord,
        failure_reason: &str,
    ) -> Result<RemediationRecord> {
        match self
            .rollback
            .auto_rollback_on_failure(&record.id, failure_reason)
            .await
        {
            Ok(rb) => match &rb.status {
                RollbackStatus::Completed { completed_at } => {
                    record.rollback_id = Some(rb.id.clone());
                    record.transition(RemediationStatus::RolledBack {
                        rollback_id: rb.id.clone(),
                        rolled_back_at: *completed_at,
                    });
                    self.commit(&record).await?;
                    self.emit(
                        MendEvent::RemediationRolledBack {
                            remediation_id: record.id.clone(),
                            rollback_id: rb.id.clone(),
                        },
                        EventSeverity::Warning,
                    );
                }
                RollbackStatus::Failed { reason, .. } => {
                    // Stays failed, annotated with the rollback failure.
                    record.rollback_id = Some(rb.id.clone());
                    let annotation = reason.clone();
                    if let RemediationStatus::Failed {
                        rollback_failure, ..
                    } = &mut record.status
                    {
                        *rollback_failure = Some(annotation);
                    }
                    record.updated_at = Utc::now();
                    self.commit(&record).await?;
                }
                RollbackStatus::Skipped { .. } | RollbackStatus::Pending => {}
            },
            Err(e) => {
                if let RemediationStatus::Failed {
                    rollback_failure, ..
                } = &mut record.status
                {
                    *rollback_failure = Some(e.to_string());
                }
                record.updated_at = Utc::now();
                self.commit(&record).await?;
            }
        }
        Ok(record)
    }

    /// Write the ledger, then update the in-memory record. A ledger
    /// failure leaves the in-memory state untouched, so the caller's
    /// transition is aborted rather than half-applied.
    async fn commit(&self, record: &RemediationRecord) -> Result<()> {
        self.ledger
            .put_remediation(record)
            .await
            .map_err(|e| OrchestratorError::Persistence(e.to_string()))?;
        self.records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn lock_for(&self, id: &RemediationId) -> Arc<Mutex<()>> {
        self.locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn emit(&self, event: MendEvent, severity: EventSeverity) {
        let envelope = MendEventEnvelope::new(event, EventSource::Orchestrator, severity);
        let _ = self.event_tx.send(envelope);
    }
}
