//! Storage trait definition.
//!
//! Defines the interface for snapshot storage backends.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mend_types::{Snapshot, SnapshotId};

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Store a snapshot.
    async fn store(&self, snapshot: &Snapshot) -> Result<()>;

    /// Load a snapshot by ID.
    async fn load(&self, id: &SnapshotId) -> Result<Option<Snapshot>>;

    /// List snapshots for a resource, newest first.
    async fn list_for_resource(&self, resource_uri: &str) -> Result<Vec<Snapshot>>;

    /// Delete a snapshot.
    async fn delete(&self, id: &SnapshotId) -> Result<()>;

    /// Remove snapshots whose expiry has passed.
    ///
    /// Returns the number of snapshots deleted. Readers holding a snapshot
    /// returned earlier keep their owned copy; the sweep only reclaims
    /// storage.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize>;

    /// Check if a snapshot exists.
    async fn exists(&self, id: &SnapshotId) -> Result<bool> {
        Ok(self.load(id).await?.is_some())
    }
}
