//! Ledger trait and statistics
//!
//! Writes are atomic per record and immediately visible to readers of the
//! same id (read-after-write). Listing is ordered by creation time
//! descending; the cursor is the id of the last record of the previous
//! page.

use crate::error::Result;
use async_trait::async_trait;
use mend_types::{RemediationId, RemediationRecord, RollbackId, RollbackRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Durable store of remediation and rollback records
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Write a remediation record (insert or replace by id)
    async fn put_remediation(&self, record: &RemediationRecord) -> Result<()>;

    /// Read a remediation record
    async fn get_remediation(&self, id: &RemediationId) -> Result<Option<RemediationRecord>>;

    /// List remediation records, newest first, starting after `cursor`
    async fn list_remediations(
        &self,
        limit: usize,
        cursor: Option<&RemediationId>,
    ) -> Result<Vec<RemediationRecord>>;

    /// Write a rollback record (insert or replace by id)
    async fn put_rollback(&self, record: &RollbackRecord) -> Result<()>;

    /// Read a rollback record
    async fn get_rollback(&self, id: &RollbackId) -> Result<Option<RollbackRecord>>;

    /// List rollback records, newest first
    async fn list_rollbacks(&self, limit: usize) -> Result<Vec<RollbackRecord>>;

    /// Rollbacks that reference the given remediation
    async fn rollbacks_for_remediation(&self, id: &RemediationId) -> Result<Vec<RollbackRecord>>;

    /// Aggregate counts over the ledger
    async fn statistics(&self) -> Result<LedgerStatistics>;
}

/// Aggregate counts over the ledger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerStatistics {
    /// Total remediation records
    pub total_remediations: usize,

    /// Remediation counts keyed by status name
    pub remediations_by_status: HashMap<String, usize>,

    /// Total rollback records
    pub total_rollbacks: usize,

    /// Rollback counts keyed by status name
    pub rollbacks_by_status: HashMap<String, usize>,
}
