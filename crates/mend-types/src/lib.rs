//! MEND Types - Core types for remediation orchestration
//!
//! MEND (Managed Engine for Non-destructive remediation) is the safety core
//! that turns a requested infrastructure action into a tracked, policy-checked,
//! possibly-approved, possibly-retried, possibly-reversed operation.
//!
//! ## Architectural Boundaries
//!
//! - **MEND** owns: the remediation lifecycle, approval gating, retry and
//!   rollback decisions, and the audit trail of every attempt.
//! - **Action executors** own: the physical side effect against a cloud or
//!   cluster API. MEND drives their contract but never implements it.
//! - **Resource providers** own: read-only state capture consumed by the
//!   snapshot store.
//!
//! ## Key Concepts
//!
//! - [`ActionSpec`]: What an action needs (arguments) and how dangerous it is
//! - [`RemediationRecord`]: The full lifecycle of one submitted request
//! - [`Snapshot`]: A captured pre-change state blob, restorable later
//! - [`RollbackRecord`]: The outcome of reversing a remediation or snapshot
//! - [`RemediationPolicy`]: Process-wide governance, loaded once
//! - [`MendEvent`]: Unified observability stream

#![deny(unsafe_code)]

pub mod action;
pub mod events;
pub mod ids;
pub mod policy;
pub mod record;
pub mod rollback;
pub mod snapshot;

// Re-export main types
pub use action::{
    ActionKind, ActionSpec, ArgKind, ArgSpec, Arguments, RiskTier, SpecValidationError,
};
pub use events::{EventSeverity, EventSource, MendEvent, MendEventEnvelope};
pub use ids::{RemediationId, RollbackId, SnapshotId};
pub use policy::RemediationPolicy;
pub use record::{
    AttemptOutcome, AttemptRecord, ExecutionOutcome, RemediationRecord, RemediationRequest,
    RemediationStatus,
};
pub use rollback::{RollbackRecord, RollbackStatus, RollbackTarget};
pub use snapshot::{Snapshot, SnapshotTrigger};
