//! MEND Rollback - Reversing remediations
//!
//! The rollback manager reverses the effect of a remediation, either by
//! restoring the most relevant snapshot for the remediation's resource or
//! by invoking the inverse action through the executor seam. A failed
//! rollback is never retried automatically: retrying an already-failed
//! reversal risks compounding damage, so it is reported and left for
//! manual intervention.
//!
//! Remediation records are owned by the orchestrator; this crate reads
//! them and writes [`RollbackRecord`](mend_types::RollbackRecord)s. The
//! orchestrator cross-links the result onto the original record.

#![deny(unsafe_code)]

mod error;
mod executor;
mod manager;

pub use error::{Result, RollbackError};
pub use executor::{FailingRollbackExecutor, NoOpRollbackExecutor, RollbackExecutor};
pub use manager::RollbackManager;
