//! Resource state snapshot types
//!
//! A snapshot captures whatever opaque state descriptor the resource
//! provider returns for a resource, so a later rollback can restore it.

use crate::SnapshotId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a snapshot was captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotTrigger {
    /// Explicit caller request
    Manual,
    /// Captured automatically before a risky remediation
    PreRemediation,
}

impl std::fmt::Display for SnapshotTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotTrigger::Manual => write!(f, "manual"),
            SnapshotTrigger::PreRemediation => write!(f, "pre-remediation"),
        }
    }
}

/// A captured, restorable description of a resource's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unique id
    pub id: SnapshotId,

    /// The resource this snapshot describes
    pub resource_uri: String,

    /// When the state was captured
    pub captured_at: DateTime<Utc>,

    /// Opaque state blob from the resource provider
    pub state: serde_json::Value,

    /// Human-readable description
    pub description: String,

    /// Why the snapshot was captured
    pub trigger: SnapshotTrigger,

    /// When retention policy makes this snapshot eligible for removal
    pub expires_at: DateTime<Utc>,
}

impl Snapshot {
    /// Whether the retention window has passed
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
