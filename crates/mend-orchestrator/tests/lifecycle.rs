//! End-to-end lifecycle scenarios through the service facade.

use async_trait::async_trait;
use mend_orchestrator::{
    ActionExecutor, ExecutorError, FlakyActionExecutor, OrchestratorError, RemediationService,
};
use mend_types::{ActionKind, Arguments, ExecutionOutcome, RemediationPolicy};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Executor that counts invocations and succeeds.
#[derive(Default)]
struct CountingExecutor {
    calls: AtomicU32,
}

impl CountingExecutor {
    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActionExecutor for CountingExecutor {
    async fn execute(
        &self,
        action: ActionKind,
        _arguments: &Arguments,
    ) -> Result<ExecutionOutcome, ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ExecutionOutcome::success(
            format!("{} applied", action),
            json!({"resources_affected": 1}),
        ))
    }
}

fn fast_policy() -> RemediationPolicy {
    RemediationPolicy {
        require_approval: false,
        max_retries: 2,
        retry_backoff: Duration::from_millis(5),
        execution_timeout: Duration::from_millis(200),
        ..Default::default()
    }
}

fn resource_args(uri: &str) -> Arguments {
    let mut args = Arguments::new();
    args.insert("resource_uri".into(), json!(uri));
    args
}

#[tokio::test]
async fn restart_retries_twice_then_succeeds() {
    // Executor fails twice; with max_retries = 2 the third attempt wins.
    let service = RemediationService::builder()
        .policy(fast_policy())
        .executor(Arc::new(FlakyActionExecutor::new(2)))
        .build();

    let record = service
        .submit(
            "restart_service",
            resource_args("infra://aws/ec2/r1"),
            "operator-a",
            "oom",
        )
        .await
        .unwrap();

    assert_eq!(record.status.name(), "completed");
    assert_eq!(record.attempts.len(), 3);
    assert!(record.attempts[2].outcome.is_success());
}

#[tokio::test]
async fn approval_gate_blocks_execution_until_approved() {
    let policy = RemediationPolicy {
        require_approval: true,
        ..fast_policy()
    };
    let executor = Arc::new(CountingExecutor::default());
    let service = RemediationService::builder()
        .policy(policy)
        .executor(executor.clone())
        .build();

    let record = service
        .submit(
            "restart_service",
            resource_args("infra://aws/ec2/r1"),
            "operator-a",
            "hung",
        )
        .await
        .unwrap();

    // Parked, and the executor has never run.
    assert_eq!(record.status.name(), "awaiting_approval");
    assert_eq!(executor.calls(), 0);

    let approved = service.approve(&record.id, "operator-b").await.unwrap();
    assert_eq!(approved.status.name(), "completed");
    assert_eq!(executor.calls(), 1);
}

#[tokio::test]
async fn rejected_record_cannot_be_approved_later() {
    let policy = RemediationPolicy {
        require_approval: true,
        ..fast_policy()
    };
    let service = RemediationService::builder().policy(policy).build();

    let mut args = resource_args("infra://aws/asg/web");
    args.insert("target_capacity".into(), json!(2));
    let record = service
        .submit("scale_down", args, "operator-a", "cost spike")
        .await
        .unwrap();
    assert_eq!(record.status.name(), "awaiting_approval");

    let rejected = service
        .reject(&record.id, "opA", "too risky")
        .await
        .unwrap();
    assert_eq!(rejected.status.name(), "rejected_by_caller");
    assert_eq!(rejected.rejected_by.as_deref(), Some("opA"));

    let err = service.approve(&record.id, "opB").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::InvalidState { .. }));
}

#[tokio::test]
async fn disallowed_action_is_rejected_without_execution() {
    let policy = RemediationPolicy {
        allowed_actions: [ActionKind::ClearCache].into_iter().collect(),
        ..fast_policy()
    };
    let executor = Arc::new(CountingExecutor::default());
    let service = RemediationService::builder()
        .policy(policy)
        .executor(executor.clone())
        .build();

    let record = service
        .submit(
            "restart_service",
            resource_args("infra://aws/ec2/r1"),
            "operator-a",
            "oom",
        )
        .await
        .unwrap();

    assert_eq!(record.status.name(), "rejected_by_policy");
    assert_eq!(executor.calls(), 0);

    // The rejection itself is auditable.
    let listed = service.list(10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status.name(), "rejected_by_policy");
}

#[tokio::test]
async fn snapshot_survives_early_sweep_and_expires_later() {
    let policy = RemediationPolicy {
        snapshot_retention: Duration::from_millis(50),
        ..fast_policy()
    };
    let service = RemediationService::builder().policy(policy).build();

    let snapshot = service
        .create_snapshot("infra://aws/ec2/r1", "pre-change")
        .await
        .unwrap();

    // Sweeping before the retention window elapses removes nothing.
    assert_eq!(service.sweep_snapshots().await.unwrap(), 0);
    assert_eq!(
        service
            .list_snapshots("infra://aws/ec2/r1", 10)
            .await
            .unwrap()
            .len(),
        1
    );

    tokio::time::sleep(Duration::from_millis(70)).await;

    // Expired: invisible to listing, and the sweep reclaims it.
    assert!(service
        .list_snapshots("infra://aws/ec2/r1", 10)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(service.sweep_snapshots().await.unwrap(), 1);
    let err = service
        .restore_snapshot(&snapshot.id, "too late")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        mend_rollback::RollbackError::SnapshotNotFound(_)
    ));
}

#[tokio::test]
async fn failed_remediation_rolls_back_automatically() {
    struct AlwaysFailing;
    #[async_trait]
    impl ActionExecutor for AlwaysFailing {
        async fn execute(
            &self,
            _action: ActionKind,
            _arguments: &Arguments,
        ) -> Result<ExecutionOutcome, ExecutorError> {
            Err(ExecutorError::Failed("disk on fire".into()))
        }
    }

    let service = RemediationService::builder()
        .policy(fast_policy())
        .executor(Arc::new(AlwaysFailing))
        .build();

    let mut args = resource_args("infra://aws/asg/web");
    args.insert("target_capacity".into(), json!(2));
    let record = service
        .submit("scale_down", args, "operator-a", "cost spike")
        .await
        .unwrap();

    // scale_down is high risk: a pre-change snapshot existed, so the
    // rollback restored it and the record ends rolled back.
    assert_eq!(record.status.name(), "rolled_back");
    assert_eq!(record.attempts.len(), 3);
    assert!(record.rollback_id.is_some());

    let stats = service.statistics().await.unwrap();
    assert_eq!(stats.total_rollbacks, 1);
    assert_eq!(stats.rollbacks_by_status.get("completed"), Some(&1));
}
