//! MEND Snapshot - Resource state capture with retention
//!
//! Before a risky change, MEND captures whatever opaque state descriptor
//! the resource provider returns, so a rollback can restore it later.
//! Snapshots expire after the policy retention window; expiry is honored at
//! read time, and a lazy sweep reclaims storage.
//!
//! ## Key Components
//!
//! - [`SnapshotStore`]: capture / get / list / sweep
//! - [`ResourceStateProvider`]: collaborator seam for read-only state capture
//! - [`storage`]: pluggable storage backends

#![deny(unsafe_code)]

mod error;
mod provider;
pub mod storage;
mod store;

pub use error::{Result, SnapshotError};
pub use provider::{FailingStateProvider, ResourceStateProvider, StaticStateProvider};
pub use storage::{InMemorySnapshotStorage, SnapshotStorage};
pub use store::SnapshotStore;
