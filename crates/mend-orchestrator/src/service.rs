//! Remediation service facade
//!
//! Wires the registry, snapshot store, ledger, rollback manager, and
//! orchestrator into the single surface a protocol-facing layer calls.

use crate::error::{OrchestratorError, Result};
use crate::executor::{ActionExecutor, StaticActionExecutor};
use crate::orchestrator::RemediationOrchestrator;
use mend_ledger::{InMemoryLedger, Ledger, LedgerStatistics};
use mend_registry::ActionRegistry;
use mend_rollback::{NoOpRollbackExecutor, RollbackExecutor, RollbackManager};
use mend_snapshot::{
    InMemorySnapshotStorage, ResourceStateProvider, SnapshotStorage, SnapshotStore,
    StaticStateProvider,
};
use mend_types::{
    Arguments, MendEventEnvelope, RemediationId, RemediationPolicy, RemediationRecord,
    RemediationRequest, RollbackRecord, Snapshot, SnapshotId, SnapshotTrigger,
};
use std::sync::Arc;
use tokio::sync::broadcast;

/// The remediation core as one callable surface
pub struct RemediationService {
    registry: Arc<ActionRegistry>,
    orchestrator: Arc<RemediationOrchestrator>,
    snapshots: Arc<SnapshotStore>,
    rollback: Arc<RollbackManager>,
    ledger: Arc<dyn Ledger>,
    event_tx: broadcast::Sender<MendEventEnvelope>,
}

impl RemediationService {
    /// Start building a service
    pub fn builder() -> RemediationServiceBuilder {
        RemediationServiceBuilder::default()
    }

    /// Submit a remediation by action name.
    ///
    /// Resolves the name through the registry (`UnknownAction` on a miss),
    /// then hands the typed request to the orchestrator.
    pub async fn submit(
        &self,
        action_name: &str,
        arguments: Arguments,
        requested_by: impl Into<String>,
        reason: impl Into<String>,
    ) -> Result<RemediationRecord> {
        let spec = self
            .registry
            .resolve_name(action_name)
            .map_err(OrchestratorError::from)?;

        self.orchestrator
            .submit(RemediationRequest::new(
                spec.kind,
                arguments,
                requested_by,
                reason,
            ))
            .await
    }

    /// Approve a parked remediation and run it
    pub async fn approve(
        &self,
        id: &RemediationId,
        approver: &str,
    ) -> Result<RemediationRecord> {
        self.orchestrator.approve(id, approver).await
    }

    /// Reject a parked remediation
    pub async fn reject(
        &self,
        id: &RemediationId,
        rejector: &str,
        reason: &str,
    ) -> Result<RemediationRecord> {
        self.orchestrator.reject(id, rejector, reason).await
    }

    /// Read a remediation record
    pub async fn get(&self, id: &RemediationId) -> Result<RemediationRecord> {
        self.orchestrator.get(id).await
    }

    /// List remediation records, newest first
    pub async fn list(&self, limit: usize) -> Result<Vec<RemediationRecord>> {
        self.orchestrator.list(limit, None).await
    }

    /// Roll back a remediation, then cross-link the result onto the record
    pub async fn rollback(
        &self,
        id: &RemediationId,
        reason: impl Into<String>,
        force: bool,
    ) -> std::result::Result<RollbackRecord, mend_rollback::RollbackError> {
        let record = self.rollback.rollback(id, reason, force).await?;
        // Cross-link through the record's owner. The rollback is already
        // durable; a linking failure must not discard it.
        if let Err(e) = self.orchestrator.link_rollback(id, &record).await {
            tracing::warn!(remediation_id = %id, error = %e, "rollback recorded but cross-link failed");
        }
        Ok(record)
    }

    /// Restore a named snapshot directly
    pub async fn restore_snapshot(
        &self,
        snapshot_id: &SnapshotId,
        reason: impl Into<String>,
    ) -> std::result::Result<RollbackRecord, mend_rollback::RollbackError> {
        self.rollback.restore_snapshot(snapshot_id, reason).await
    }

    /// Capture a snapshot of a resource on caller request
    pub async fn create_snapshot(
        &self,
        resource_uri: &str,
        description: impl Into<String>,
    ) -> std::result::Result<Snapshot, mend_snapshot::SnapshotError> {
        self.snapshots
            .capture(resource_uri, description, SnapshotTrigger::Manual)
            .await
    }

    /// List unexpired snapshots for a resource, newest first
    pub async fn list_snapshots(
        &self,
        resource_uri: &str,
        limit: usize,
    ) -> std::result::Result<Vec<Snapshot>, mend_snapshot::SnapshotError> {
        self.snapshots.list_for_resource(resource_uri, limit).await
    }

    /// Reclaim expired snapshots
    pub async fn sweep_snapshots(&self) -> std::result::Result<usize, mend_snapshot::SnapshotError> {
        self.snapshots.sweep_expired().await
    }

    /// Aggregate counts over the ledger
    pub async fn statistics(&self) -> Result<LedgerStatistics> {
        self.ledger
            .statistics()
            .await
            .map_err(|e| OrchestratorError::Persistence(e.to_string()))
    }

    /// Subscribe to the unified event stream
    pub fn subscribe(&self) -> broadcast::Receiver<MendEventEnvelope> {
        self.event_tx.subscribe()
    }

    /// The action catalog
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }
}

/// Builder for [`RemediationService`]
pub struct RemediationServiceBuilder {
    policy: RemediationPolicy,
    registry: Arc<ActionRegistry>,
    executor: Arc<dyn ActionExecutor>,
    rollback_executor: Arc<dyn RollbackExecutor>,
    provider: Arc<dyn ResourceStateProvider>,
    storage: Arc<dyn SnapshotStorage>,
    ledger: Arc<dyn Ledger>,
}

impl Default for RemediationServiceBuilder {
    fn default() -> Self {
        Self {
            policy: RemediationPolicy::default(),
            registry: Arc::new(ActionRegistry::builtin()),
            executor: Arc::new(StaticActionExecutor::default()),
            rollback_executor: Arc::new(NoOpRollbackExecutor),
            provider: Arc::new(StaticStateProvider::default()),
            storage: Arc::new(InMemorySnapshotStorage::new()),
            ledger: Arc::new(InMemoryLedger::new()),
        }
    }
}

impl RemediationServiceBuilder {
    /// Set the governance policy
    pub fn policy(mut self, policy: RemediationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the action catalog
    pub fn registry(mut self, registry: Arc<ActionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Set the action executor
    pub fn executor(mut self, executor: Arc<dyn ActionExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Set the rollback executor
    pub fn rollback_executor(mut self, executor: Arc<dyn RollbackExecutor>) -> Self {
        self.rollback_executor = executor;
        self
    }

    /// Set the resource state provider
    pub fn state_provider(mut self, provider: Arc<dyn ResourceStateProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// Set the snapshot storage backend
    pub fn snapshot_storage(mut self, storage: Arc<dyn SnapshotStorage>) -> Self {
        self.storage = storage;
        self
    }

    /// Set the history ledger
    pub fn ledger(mut self, ledger: Arc<dyn Ledger>) -> Self {
        self.ledger = ledger;
        self
    }

    /// Wire everything together on a shared event channel
    pub fn build(self) -> RemediationService {
        let (event_tx, _) = broadcast::channel(4096);

        let snapshots = Arc::new(
            SnapshotStore::new(self.storage, self.provider, self.policy.snapshot_retention)
                .with_event_sender(event_tx.clone()),
        );

        let rollback = Arc::new(
            RollbackManager::new(
                self.ledger.clone(),
                snapshots.clone(),
                self.rollback_executor,
                self.policy.clone(),
            )
            .with_event_sender(event_tx.clone()),
        );

        let orchestrator = Arc::new(
            RemediationOrchestrator::new(
                self.registry.clone(),
                self.policy,
                self.executor,
                self.ledger.clone(),
                snapshots.clone(),
                rollback.clone(),
            )
            .with_event_sender(event_tx.clone()),
        );

        RemediationService {
            registry: self.registry,
            orchestrator,
            snapshots,
            rollback,
            ledger: self.ledger,
            event_tx,
        }
    }
}
