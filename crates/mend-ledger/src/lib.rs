//! MEND Ledger - Audit history of remediations and rollbacks
//!
//! The ledger is the durable, queryable record of every remediation and
//! rollback attempt. The orchestrator writes it on every transition and
//! treats a write failure as fatal to the in-flight call, so in-memory and
//! durable state never diverge.

#![deny(unsafe_code)]

mod error;
mod ledger;
mod memory;

pub use error::{LedgerError, Result};
pub use ledger::{Ledger, LedgerStatistics};
pub use memory::{FailingLedger, InMemoryLedger};
