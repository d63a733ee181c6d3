//! The snapshot store
//!
//! Wraps a storage backend and a resource state provider, applies the
//! retention policy, and emits observability events.

use crate::error::{Result, SnapshotError};
use crate::provider::ResourceStateProvider;
use crate::storage::SnapshotStorage;
use chrono::Utc;
use mend_types::{
    EventSeverity, EventSource, MendEvent, MendEventEnvelope, Snapshot, SnapshotId,
    SnapshotTrigger,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

/// Captures, serves, and expires resource state snapshots
pub struct SnapshotStore {
    storage: Arc<dyn SnapshotStorage>,
    provider: Arc<dyn ResourceStateProvider>,
    retention: Duration,
    event_tx: broadcast::Sender<MendEventEnvelope>,
}

impl SnapshotStore {
    /// Create a store with the given backend, provider, and retention window
    pub fn new(
        storage: Arc<dyn SnapshotStorage>,
        provider: Arc<dyn ResourceStateProvider>,
        retention: Duration,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(1024);
        Self {
            storage,
            provider,
            retention,
            event_tx,
        }
    }

    /// Use an external event channel instead of a private one
    pub fn with_event_sender(mut self, event_tx: broadcast::Sender<MendEventEnvelope>) -> Self {
        self.event_tx = event_tx;
        self
    }

    /// Capture the current state of a resource.
    ///
    /// Always succeeds when the provider returns a blob; expiry is
    /// `now + retention`.
    #[instrument(skip(self, description), fields(resource_uri = %resource_uri))]
    pub async fn capture(
        &self,
        resource_uri: &str,
        description: impl Into<String>,
        trigger: SnapshotTrigger,
    ) -> Result<Snapshot> {
        let state = self.provider.capture_state(resource_uri).await?;
        let now = Utc::now();

        let snapshot = Snapshot {
            id: SnapshotId::generate(),
            resource_uri: resource_uri.to_string(),
            captured_at: now,
            state,
            description: description.into(),
            trigger,
            expires_at: now
                + chrono::Duration::from_std(self.retention)
                    .map_err(|e| SnapshotError::Storage(e.to_string()))?,
        };

        self.storage.store(&snapshot).await?;

        info!(snapshot_id = %snapshot.id, trigger = %trigger, "snapshot captured");
        self.emit(MendEvent::SnapshotCaptured {
            snapshot_id: snapshot.id.clone(),
            resource_uri: resource_uri.to_string(),
        });

        Ok(snapshot)
    }

    /// Get a snapshot by id.
    ///
    /// An expired snapshot is `NotFound` even before the sweep reclaims it;
    /// the retention window is the contract, the sweep is bookkeeping.
    pub async fn get(&self, id: &SnapshotId) -> Result<Snapshot> {
        let snapshot = self
            .storage
            .load(id)
            .await?
            .ok_or_else(|| SnapshotError::NotFound(id.clone()))?;

        if snapshot.is_expired(Utc::now()) {
            return Err(SnapshotError::NotFound(id.clone()));
        }
        Ok(snapshot)
    }

    /// List unexpired snapshots for a resource, newest first
    pub async fn list_for_resource(
        &self,
        resource_uri: &str,
        limit: usize,
    ) -> Result<Vec<Snapshot>> {
        let now = Utc::now();
        let mut snapshots = self.storage.list_for_resource(resource_uri).await?;
        snapshots.retain(|s| !s.is_expired(now));
        snapshots.truncate(limit);
        Ok(snapshots)
    }

    /// The most recent unexpired snapshot for a resource
    pub async fn latest_for_resource(&self, resource_uri: &str) -> Result<Option<Snapshot>> {
        Ok(self.list_for_resource(resource_uri, 1).await?.into_iter().next())
    }

    /// Remove expired snapshots, returning how many were reclaimed
    #[instrument(skip(self))]
    pub async fn sweep_expired(&self) -> Result<usize> {
        let removed = self.storage.sweep_expired(Utc::now()).await?;
        if removed > 0 {
            debug!(removed, "snapshot sweep reclaimed storage");
            self.emit(MendEvent::SnapshotsSwept { removed });
        }
        Ok(removed)
    }

    /// Subscribe to snapshot events
    pub fn subscribe(&self) -> broadcast::Receiver<MendEventEnvelope> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: MendEvent) {
        let envelope = MendEventEnvelope::new(event, EventSource::Snapshot, EventSeverity::Info);
        let _ = self.event_tx.send(envelope);
    }
}
