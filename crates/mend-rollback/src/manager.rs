//! The rollback manager

use crate::error::{Result, RollbackError};
use crate::executor::RollbackExecutor;
use chrono::Utc;
use mend_ledger::Ledger;
use mend_snapshot::SnapshotStore;
use mend_types::{
    EventSeverity, EventSource, MendEvent, MendEventEnvelope, RemediationId, RemediationPolicy,
    RemediationRecord, RemediationStatus, RollbackRecord, RollbackStatus, RollbackTarget,
    SnapshotId,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

/// Reverses remediations and records the outcome
pub struct RollbackManager {
    ledger: Arc<dyn Ledger>,
    snapshots: Arc<SnapshotStore>,
    executor: Arc<dyn RollbackExecutor>,
    policy: RemediationPolicy,
    event_tx: broadcast::Sender<MendEventEnvelope>,
}

impl RollbackManager {
    /// Create a new rollback manager
    pub fn new(
        ledger: Arc<dyn Ledger>,
        snapshots: Arc<SnapshotStore>,
        executor: Arc<dyn RollbackExecutor>,
        policy: RemediationPolicy,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(1024);
        Self {
            ledger,
            snapshots,
            executor,
            policy,
            event_tx,
        }
    }

    /// Use an external event channel instead of a private one
    pub fn with_event_sender(mut self, event_tx: broadcast::Sender<MendEventEnvelope>) -> Self {
        self.event_tx = event_tx;
        self
    }

    /// Reverse the effect of a remediation.
    ///
    /// Eligible statuses are `completed` and `failed`; anything still in
    /// flight (or already rolled back) is rejected unless `force` is set.
    /// The reversal itself is not retried: a failure is recorded and
    /// surfaced for manual intervention.
    #[instrument(skip(self, reason), fields(remediation_id = %remediation_id, force = force))]
    pub async fn rollback(
        &self,
        remediation_id: &RemediationId,
        reason: impl Into<String>,
        force: bool,
    ) -> Result<RollbackRecord> {
        let remediation = self
            .ledger
            .get_remediation(remediation_id)
            .await?
            .ok_or_else(|| RollbackError::RemediationNotFound(remediation_id.clone()))?;

        if !Self::is_eligible(&remediation.status) && !force {
            return Err(RollbackError::InvalidState {
                id: remediation_id.clone(),
                status: remediation.status.name().to_string(),
            });
        }

        let mut record = RollbackRecord::new(
            RollbackTarget::Remediation(remediation_id.clone()),
            reason,
        );
        self.ledger.put_rollback(&record).await?;
        self.emit(
            MendEvent::RollbackStarted {
                rollback_id: record.id.clone(),
                reason: record.reason.clone(),
            },
            EventSeverity::Info,
        );

        let outcome = self.reverse(&remediation).await;
        self.finish(&mut record, outcome).await?;
        Ok(record)
    }

    /// Restore a named snapshot directly
    #[instrument(skip(self, reason), fields(snapshot_id = %snapshot_id))]
    pub async fn restore_snapshot(
        &self,
        snapshot_id: &SnapshotId,
        reason: impl Into<String>,
    ) -> Result<RollbackRecord> {
        let snapshot = self.snapshots.get(snapshot_id).await.map_err(|e| match e {
            mend_snapshot::SnapshotError::NotFound(id) => RollbackError::SnapshotNotFound(id),
            other => RollbackError::Snapshot(other),
        })?;

        let mut record =
            RollbackRecord::new(RollbackTarget::Snapshot(snapshot_id.clone()), reason);
        self.ledger.put_rollback(&record).await?;
        self.emit(
            MendEvent::RollbackStarted {
                rollback_id: record.id.clone(),
                reason: record.reason.clone(),
            },
            EventSeverity::Info,
        );

        let outcome = self.executor.restore_snapshot(&snapshot).await;
        self.finish(&mut record, outcome).await?;
        Ok(record)
    }

    /// Automatic rollback of a failed remediation.
    ///
    /// Invoked only by the orchestrator after every attempt has failed.
    /// Returns a `skipped` record without touching the executor when policy
    /// disables rollback-on-failure, so the decision lives in policy rather
    /// than at every call site.
    pub async fn auto_rollback_on_failure(
        &self,
        remediation_id: &RemediationId,
        failure_reason: &str,
    ) -> Result<RollbackRecord> {
        if !self.policy.rollback_on_failure {
            let mut record = RollbackRecord::new(
                RollbackTarget::Remediation(remediation_id.clone()),
                format!("auto-rollback after failure: {}", failure_reason),
            );
            record.status = RollbackStatus::Skipped {
                reason: "rollback on failure is disabled by policy".to_string(),
            };
            self.ledger.put_rollback(&record).await?;
            return Ok(record);
        }

        warn!(
            remediation_id = %remediation_id,
            failure_reason,
            "auto-rolling back failed remediation"
        );

        self.rollback(
            remediation_id,
            format!("auto-rollback after failure: {}", failure_reason),
            false,
        )
        .await
    }

    /// Subscribe to rollback events
    pub fn subscribe(&self) -> broadcast::Receiver<MendEventEnvelope> {
        self.event_tx.subscribe()
    }

    fn is_eligible(status: &RemediationStatus) -> bool {
        matches!(
            status,
            RemediationStatus::Completed { .. } | RemediationStatus::Failed { .. }
        )
    }

    /// Prefer restoring the latest snapshot for the remediation's resource;
    /// fall back to the inverse action when no snapshot exists.
    async fn reverse(&self, remediation: &RemediationRecord) -> std::result::Result<(), String> {
        if let Some(resource_uri) = remediation.resource_uri() {
            match self.snapshots.latest_for_resource(resource_uri).await {
                Ok(Some(snapshot)) => return self.executor.restore_snapshot(&snapshot).await,
                Ok(None) => {}
                Err(e) => return Err(e.to_string()),
            }
        }
        self.executor.invert(remediation).await
    }

    async fn finish(
        &self,
        record: &mut RollbackRecord,
        outcome: std::result::Result<(), String>,
    ) -> Result<()> {
        match outcome {
            Ok(()) => {
                record.status = RollbackStatus::Completed {
                    completed_at: Utc::now(),
                };
                info!(rollback_id = %record.id, "rollback completed");
                self.emit(
                    MendEvent::RollbackCompleted {
                        rollback_id: record.id.clone(),
                    },
                    EventSeverity::Info,
                );
            }
            Err(reason) => {
                record.status = RollbackStatus::Failed {
                    reason: reason.clone(),
                    failed_at: Utc::now(),
                };
                warn!(rollback_id = %record.id, reason = %reason, "rollback failed; manual intervention required");
                self.emit(
                    MendEvent::RollbackFailed {
                        rollback_id: record.id.clone(),
                        reason,
                    },
                    EventSeverity::Error,
                );
            }
        }
        self.ledger.put_rollback(record).await?;
        Ok(())
    }

    fn emit(&self, event: MendEvent, severity: EventSeverity) {
        let envelope = MendEventEnvelope::new(event, EventSource::Rollback, severity);
        let _ = self.event_tx.send(envelope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{FailingRollbackExecutor, NoOpRollbackExecutor};
    use mend_ledger::InMemoryLedger;
    use mend_snapshot::{InMemorySnapshotStorage, SnapshotStore, StaticStateProvider};
    use mend_types::{ActionKind, Arguments, RemediationRequest, SnapshotTrigger};
    use serde_json::json;
    use std::time::Duration;

    struct Fixture {
        ledger: Arc<InMemoryLedger>,
        snapshots: Arc<SnapshotStore>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                ledger: Arc::new(InMemoryLedger::new()),
                snapshots: Arc::new(SnapshotStore::new(
                    Arc::new(InMemorySnapshotStorage::new()),
                    Arc::new(StaticStateProvider::default()),
                    Duration::from_secs(3600),
                )),
            }
        }

        fn manager(&self, executor: Arc<dyn RollbackExecutor>, policy: RemediationPolicy) -> RollbackManager {
            RollbackManager::new(self.ledger.clone(), self.snapshots.clone(), executor, policy)
        }

        async fn failed_remediation(&self) -> RemediationRecord {
            let mut args = Arguments::new();
            args.insert("resource_uri".into(), json!("infra://aws/ec2/i-1"));
            let mut rec = RemediationRecord::new(RemediationRequest::new(
                ActionKind::ScaleDown,
                args,
                "op-a",
                "overload",
            ));
            rec.transition(RemediationStatus::Executing);
            rec.transition(RemediationStatus::Failed {
                reason: "executor exploded".into(),
                failed_at: Utc::now(),
                rollback_failure: None,
            });
            self.ledger.put_remediation(&rec).await.unwrap();
            rec
        }
    }

    #[tokio::test]
    async fn test_rollback_missing_remediation() {
        let fx = Fixture::new();
        let manager = fx.manager(Arc::new(NoOpRollbackExecutor), RemediationPolicy::default());

        let err = manager
            .rollback(&RemediationId::generate(), "nope", false)
            .await
            .unwrap_err();
        assert!(matches!(err, RollbackError::RemediationNotFound(_)));
    }

    #[tokio::test]
    async fn test_rollback_in_flight_requires_force() {
        let fx = Fixture::new();
        let manager = fx.manager(Arc::new(NoOpRollbackExecutor), RemediationPolicy::default());

        let mut args = Arguments::new();
        args.insert("resource_uri".into(), json!("infra://aws/ec2/i-1"));
        let mut rec = RemediationRecord::new(RemediationRequest::new(
            ActionKind::RestartService,
            args,
            "op-a",
            "hung",
        ));
        rec.transition(RemediationStatus::AwaitingApproval);
        fx.ledger.put_remediation(&rec).await.unwrap();

        let err = manager.rollback(&rec.id, "changed my mind", false).await.unwrap_err();
        assert!(matches!(err, RollbackError::InvalidState { .. }));

        // Forced rollback of the same record goes through.
        let record = manager.rollback(&rec.id, "changed my mind", true).await.unwrap();
        assert!(record.status.is_completed());
    }

    #[tokio::test]
    async fn test_rollback_prefers_snapshot_restore() {
        let fx = Fixture::new();
        let rec = fx.failed_remediation().await;
        fx.snapshots
            .capture("infra://aws/ec2/i-1", "pre-change", SnapshotTrigger::PreRemediation)
            .await
            .unwrap();

        // Executor whose invert path fails: success proves the snapshot
        // path was taken.
        struct RestoreOnly;
        #[async_trait::async_trait]
        impl RollbackExecutor for RestoreOnly {
            async fn restore_snapshot(&self, _s: &mend_types::Snapshot) -> std::result::Result<(), String> {
                Ok(())
            }
            async fn invert(&self, _r: &RemediationRecord) -> std::result::Result<(), String> {
                Err("invert should not be called".into())
            }
        }

        let manager = fx.manager(Arc::new(RestoreOnly), RemediationPolicy::default());
        let record = manager.rollback(&rec.id, "reverse it", false).await.unwrap();
        assert!(record.status.is_completed());
    }

    #[tokio::test]
    async fn test_rollback_falls_back_to_inverse_action() {
        let fx = Fixture::new();
        let rec = fx.failed_remediation().await;
        // No snapshot captured for the resource.

        let manager = fx.manager(Arc::new(NoOpRollbackExecutor), RemediationPolicy::default());
        let record = manager.rollback(&rec.id, "reverse it", false).await.unwrap();
        assert!(record.status.is_completed());
    }

    #[tokio::test]
    async fn test_failed_rollback_is_recorded_not_retried() {
        let fx = Fixture::new();
        let rec = fx.failed_remediation().await;

        let manager = fx.manager(Arc::new(FailingRollbackExecutor), RemediationPolicy::default());
        let record = manager.rollback(&rec.id, "reverse it", false).await.unwrap();

        assert!(matches!(record.status, RollbackStatus::Failed { .. }));
        let stored = fx.ledger.get_rollback(&record.id).await.unwrap().unwrap();
        assert!(matches!(stored.status, RollbackStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn test_auto_rollback_skipped_when_disabled() {
        let fx = Fixture::new();
        let rec = fx.failed_remediation().await;

        let policy = RemediationPolicy {
            rollback_on_failure: false,
            ..Default::default()
        };
        let manager = fx.manager(Arc::new(FailingRollbackExecutor), policy);

        let record = manager
            .auto_rollback_on_failure(&rec.id, "all attempts failed")
            .await
            .unwrap();
        assert!(matches!(record.status, RollbackStatus::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_auto_rollback_references_remediation() {
        let fx = Fixture::new();
        let rec = fx.failed_remediation().await;

        let manager = fx.manager(Arc::new(NoOpRollbackExecutor), RemediationPolicy::default());
        let record = manager
            .auto_rollback_on_failure(&rec.id, "all attempts failed")
            .await
            .unwrap();

        assert_eq!(record.remediation_id(), Some(&rec.id));
        let linked = fx.ledger.rollbacks_for_remediation(&rec.id).await.unwrap();
        assert_eq!(linked.len(), 1);
    }

    #[tokio::test]
    async fn test_restore_snapshot_directly() {
        let fx = Fixture::new();
        let snapshot = fx
            .snapshots
            .capture("infra://aws/ec2/i-9", "manual point", SnapshotTrigger::Manual)
            .await
            .unwrap();

        let manager = fx.manager(Arc::new(NoOpRollbackExecutor), RemediationPolicy::default());
        let record = manager
            .restore_snapshot(&snapshot.id, "restore known-good state")
            .await
            .unwrap();

        assert!(record.status.is_completed());
        assert_eq!(record.target, RollbackTarget::Snapshot(snapshot.id));
    }

    #[tokio::test]
    async fn test_restore_missing_snapshot() {
        let fx = Fixture::new();
        let manager = fx.manager(Arc::new(NoOpRollbackExecutor), RemediationPolicy::default());

        let err = manager
            .restore_snapshot(&SnapshotId::generate(), "restore")
            .await
            .unwrap_err();
        assert!(matches!(err, RollbackError::SnapshotNotFound(_)));
    }
}
