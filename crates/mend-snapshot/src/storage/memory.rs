//! In-memory snapshot storage
//!
//! Suitable for development and testing. Production deployments should use
//! a persistent backend behind the same trait.

use crate::error::Result;
use crate::storage::SnapshotStorage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use mend_types::{Snapshot, SnapshotId};

/// In-memory snapshot storage
pub struct InMemorySnapshotStorage {
    snapshots: DashMap<SnapshotId, Snapshot>,
    by_resource: DashMap<String, Vec<SnapshotId>>,
}

impl InMemorySnapshotStorage {
    pub fn new() -> Self {
        Self {
            snapshots: DashMap::new(),
            by_resource: DashMap::new(),
        }
    }
}

impl Default for InMemorySnapshotStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStorage for InMemorySnapshotStorage {
    async fn store(&self, snapshot: &Snapshot) -> Result<()> {
        self.snapshots.insert(snapshot.id.clone(), snapshot.clone());

        // Index by resource
        self.by_resource
            .entry(snapshot.resource_uri.clone())
            .or_default()
            .push(snapshot.id.clone());

        Ok(())
    }

    async fn load(&self, id: &SnapshotId) -> Result<Option<Snapshot>> {
        Ok(self.snapshots.get(id).map(|s| s.clone()))
    }

    async fn list_for_resource(&self, resource_uri: &str) -> Result<Vec<Snapshot>> {
        let mut result = Vec::new();
        if let Some(ids) = self.by_resource.get(resource_uri) {
            for id in ids.iter() {
                if let Some(snapshot) = self.snapshots.get(id) {
                    result.push(snapshot.clone());
                }
            }
        }
        result.sort_by(|a, b| b.captured_at.cmp(&a.captured_at));
        Ok(result)
    }

    async fn delete(&self, id: &SnapshotId) -> Result<()> {
        if let Some((_, snapshot)) = self.snapshots.remove(id) {
            if let Some(mut ids) = self.by_resource.get_mut(&snapshot.resource_uri) {
                ids.retain(|i| i != id);
            }
        }
        Ok(())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let expired: Vec<SnapshotId> = self
            .snapshots
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();

        for id in &expired {
            self.delete(id).await?;
        }

        Ok(expired.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mend_types::SnapshotTrigger;

    fn snapshot(resource_uri: &str, ttl: Duration) -> Snapshot {
        let now = Utc::now();
        Snapshot {
            id: SnapshotId::generate(),
            resource_uri: resource_uri.to_string(),
            captured_at: now,
            state: serde_json::json!({"capacity": 3}),
            description: "test".into(),
            trigger: SnapshotTrigger::Manual,
            expires_at: now + ttl,
        }
    }

    #[tokio::test]
    async fn test_store_load_delete() {
        let storage = InMemorySnapshotStorage::new();
        let snap = snapshot("infra://aws/ec2/i-1", Duration::days(7));

        storage.store(&snap).await.unwrap();
        assert!(storage.exists(&snap.id).await.unwrap());

        storage.delete(&snap.id).await.unwrap();
        assert!(!storage.exists(&snap.id).await.unwrap());
        assert!(storage
            .list_for_resource("infra://aws/ec2/i-1")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let storage = InMemorySnapshotStorage::new();
        let live = snapshot("infra://aws/ec2/i-1", Duration::days(7));
        let dead = snapshot("infra://aws/ec2/i-2", Duration::seconds(-10));

        storage.store(&live).await.unwrap();
        storage.store(&dead).await.unwrap();

        let removed = storage.sweep_expired(Utc::now()).await.unwrap();
        assert_eq!(removed, 1);
        assert!(storage.exists(&live.id).await.unwrap());
        assert!(!storage.exists(&dead.id).await.unwrap());
    }
}
