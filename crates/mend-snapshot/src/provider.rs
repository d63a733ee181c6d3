//! Resource state provider seam
//!
//! The provider is the read-only collaborator that knows how to describe a
//! resource's current configuration and capacity. MEND never inspects the
//! blob; it only stores and returns it.

use crate::error::{Result, SnapshotError};
use async_trait::async_trait;

/// Captures the current state descriptor for a resource
#[async_trait]
pub trait ResourceStateProvider: Send + Sync {
    /// Return an opaque state blob for the resource
    async fn capture_state(&self, resource_uri: &str) -> Result<serde_json::Value>;
}

/// Provider returning a fixed descriptor, for development and tests
pub struct StaticStateProvider {
    state: serde_json::Value,
}

impl StaticStateProvider {
    /// Provider that returns the given blob for every resource
    pub fn new(state: serde_json::Value) -> Self {
        Self { state }
    }
}

impl Default for StaticStateProvider {
    fn default() -> Self {
        Self::new(serde_json::json!({
            "capacity": 3,
            "instance_type": "t3.medium",
            "auto_scaling_enabled": true,
            "health_status": "healthy",
        }))
    }
}

#[async_trait]
impl ResourceStateProvider for StaticStateProvider {
    async fn capture_state(&self, _resource_uri: &str) -> Result<serde_json::Value> {
        Ok(self.state.clone())
    }
}

/// Provider that always fails, for tests
pub struct FailingStateProvider;

#[async_trait]
impl ResourceStateProvider for FailingStateProvider {
    async fn capture_state(&self, resource_uri: &str) -> Result<serde_json::Value> {
        Err(SnapshotError::CaptureFailed {
            resource_uri: resource_uri.to_string(),
            reason: "simulated provider failure".to_string(),
        })
    }
}
