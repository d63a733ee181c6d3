//! In-memory ledger
//!
//! Suitable for development and testing. The entry maps are concurrent;
//! the creation-order index is the only shared sequence and sits behind an
//! async RwLock so appends and pages never observe partial writes.

use crate::error::{LedgerError, Result};
use crate::ledger::{Ledger, LedgerStatistics};
use async_trait::async_trait;
use dashmap::DashMap;
use mend_types::{RemediationId, RemediationRecord, RollbackId, RollbackRecord};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory ledger
pub struct InMemoryLedger {
    remediations: DashMap<RemediationId, RemediationRecord>,
    rollbacks: DashMap<RollbackId, RollbackRecord>,
    remediation_order: RwLock<Vec<RemediationId>>,
    rollback_order: RwLock<Vec<RollbackId>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            remediations: DashMap::new(),
            rollbacks: DashMap::new(),
            remediation_order: RwLock::new(Vec::new()),
            rollback_order: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn put_remediation(&self, record: &RemediationRecord) -> Result<()> {
        let first_write = !self.remediations.contains_key(&record.id);

        // Index before the entry becomes visible so a concurrent page never
        // sees an entry missing from the order.
        if first_write {
            self.remediation_order.write().await.push(record.id.clone());
        }
        self.remediations.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get_remediation(&self, id: &RemediationId) -> Result<Option<RemediationRecord>> {
        Ok(self.remediations.get(id).map(|r| r.clone()))
    }

    async fn list_remediations(
        &self,
        limit: usize,
        cursor: Option<&RemediationId>,
    ) -> Result<Vec<RemediationRecord>> {
        let order = self.remediation_order.read().await;

        let mut result = Vec::new();
        let mut past_cursor = cursor.is_none();
        for id in order.iter().rev() {
            if !past_cursor {
                if Some(id) == cursor {
                    past_cursor = true;
                }
                continue;
            }
            if result.len() >= limit {
                break;
            }
            if let Some(record) = self.remediations.get(id) {
                result.push(record.clone());
            }
        }
        Ok(result)
    }

    async fn put_rollback(&self, record: &RollbackRecord) -> Result<()> {
        let first_write = !self.rollbacks.contains_key(&record.id);
        if first_write {
            self.rollback_order.write().await.push(record.id.clone());
        }
        self.rollbacks.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get_rollback(&self, id: &RollbackId) -> Result<Option<RollbackRecord>> {
        Ok(self.rollbacks.get(id).map(|r| r.clone()))
    }

    async fn list_rollbacks(&self, limit: usize) -> Result<Vec<RollbackRecord>> {
        let order = self.rollback_order.read().await;
        let mut result = Vec::new();
        for id in order.iter().rev().take(limit) {
            if let Some(record) = self.rollbacks.get(id) {
                result.push(record.clone());
            }
        }
        Ok(result)
    }

    async fn rollbacks_for_remediation(&self, id: &RemediationId) -> Result<Vec<RollbackRecord>> {
        Ok(self
            .rollbacks
            .iter()
            .filter(|entry| entry.value().remediation_id() == Some(id))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn statistics(&self) -> Result<LedgerStatistics> {
        let mut remediations_by_status: HashMap<String, usize> = HashMap::new();
        for entry in self.remediations.iter() {
            *remediations_by_status
                .entry(entry.value().status.name().to_string())
                .or_insert(0) += 1;
        }

        let mut rollbacks_by_status: HashMap<String, usize> = HashMap::new();
        for entry in self.rollbacks.iter() {
            *rollbacks_by_status
                .entry(entry.value().status.name().to_string())
                .or_insert(0) += 1;
        }

        Ok(LedgerStatistics {
            total_remediations: self.remediations.len(),
            remediations_by_status,
            total_rollbacks: self.rollbacks.len(),
            rollbacks_by_status,
        })
    }
}

/// Ledger wrapper that fails writes on command, for persistence-abort tests
pub struct FailingLedger {
    inner: Arc<dyn Ledger>,
    fail_writes: AtomicBool,
}

impl FailingLedger {
    /// Wrap a ledger; writes succeed until `set_failing(true)`
    pub fn new(inner: Arc<dyn Ledger>) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Toggle write failures
    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(LedgerError::Storage("simulated write failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Ledger for FailingLedger {
    async fn put_remediation(&self, record: &RemediationRecord) -> Result<()> {
        self.check_write()?;
        self.inner.put_remediation(record).await
    }

    async fn get_remediation(&self, id: &RemediationId) -> Result<Option<RemediationRecord>> {
        self.inner.get_remediation(id).await
    }

    async fn list_remediations(
        &self,
        limit: usize,
        cursor: Option<&RemediationId>,
    ) -> Result<Vec<RemediationRecord>> {
        self.inner.list_remediations(limit, cursor).await
    }

    async fn put_rollback(&self, record: &RollbackRecord) -> Result<()> {
        self.check_write()?;
        self.inner.put_rollback(record).await
    }

    async fn get_rollback(&self, id: &RollbackId) -> Result<Option<RollbackRecord>> {
        self.inner.get_rollback(id).await
    }

    async fn list_rollbacks(&self, limit: usize) -> Result<Vec<RollbackRecord>> {
        self.inner.list_rollbacks(limit).await
    }

    async fn rollbacks_for_remediation(&self, id: &RemediationId) -> Result<Vec<RollbackRecord>> {
        self.inner.rollbacks_for_remediation(id).await
    }

    async fn statistics(&self) -> Result<LedgerStatistics> {
        self.inner.statistics().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mend_types::{ActionKind, Arguments, RemediationRequest, RemediationStatus};
    use serde_json::json;

    fn record(requested_by: &str) -> RemediationRecord {
        let mut args = Arguments::new();
        args.insert("resource_uri".into(), json!("infra://aws/ec2/i-1"));
        RemediationRecord::new(RemediationRequest::new(
            ActionKind::RestartService,
            args,
            requested_by,
            "cpu pegged",
        ))
    }

    #[tokio::test]
    async fn test_read_after_write() {
        let ledger = InMemoryLedger::new();
        let rec = record("op-a");

        ledger.put_remediation(&rec).await.unwrap();
        let loaded = ledger.get_remediation(&rec.id).await.unwrap().unwrap();
        assert_eq!(loaded.request.requested_by, "op-a");
    }

    #[tokio::test]
    async fn test_get_is_idempotent() {
        let ledger = InMemoryLedger::new();
        let rec = record("op-a");
        ledger.put_remediation(&rec).await.unwrap();

        let first = ledger.get_remediation(&rec.id).await.unwrap().unwrap();
        let second = ledger.get_remediation(&rec.id).await.unwrap().unwrap();
        assert_eq!(first.updated_at, second.updated_at);
        assert_eq!(first.status.name(), second.status.name());
    }

    #[tokio::test]
    async fn test_list_newest_first_with_cursor() {
        let ledger = InMemoryLedger::new();
        let a = record("op-a");
        let b = record("op-b");
        let c = record("op-c");
        for rec in [&a, &b, &c] {
            ledger.put_remediation(rec).await.unwrap();
        }

        let page = ledger.list_remediations(2, None).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, c.id);
        assert_eq!(page[1].id, b.id);

        let rest = ledger.list_remediations(2, Some(&b.id)).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, a.id);
    }

    #[tokio::test]
    async fn test_update_keeps_order_position() {
        let ledger = InMemoryLedger::new();
        let mut a = record("op-a");
        let b = record("op-b");
        ledger.put_remediation(&a).await.unwrap();
        ledger.put_remediation(&b).await.unwrap();

        a.transition(RemediationStatus::Executing);
        ledger.put_remediation(&a).await.unwrap();

        let page = ledger.list_remediations(10, None).await.unwrap();
        assert_eq!(page.len(), 2);
        // a was updated but keeps its creation-order slot
        assert_eq!(page[0].id, b.id);
        assert_eq!(page[1].id, a.id);
        assert_eq!(page[1].status.name(), "executing");
    }

    #[tokio::test]
    async fn test_rollback_cross_reference_query() {
        use mend_types::{RollbackRecord, RollbackTarget};

        let ledger = InMemoryLedger::new();
        let rec = record("op-a");
        ledger.put_remediation(&rec).await.unwrap();

        let rb = RollbackRecord::new(RollbackTarget::Remediation(rec.id.clone()), "failed");
        ledger.put_rollback(&rb).await.unwrap();

        let linked = ledger.rollbacks_for_remediation(&rec.id).await.unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].id, rb.id);
    }

    #[tokio::test]
    async fn test_statistics() {
        let ledger = InMemoryLedger::new();
        let mut a = record("op-a");
        a.transition(RemediationStatus::Executing);
        ledger.put_remediation(&a).await.unwrap();
        ledger.put_remediation(&record("op-b")).await.unwrap();

        let stats = ledger.statistics().await.unwrap();
        assert_eq!(stats.total_remediations, 2);
        assert_eq!(stats.remediations_by_status.get("executing"), Some(&1));
        assert_eq!(stats.remediations_by_status.get("pending"), Some(&1));
    }

    #[tokio::test]
    async fn test_failing_ledger_blocks_writes_only() {
        let inner = Arc::new(InMemoryLedger::new());
        let failing = FailingLedger::new(inner);

        let rec = record("op-a");
        failing.put_remediation(&rec).await.unwrap();

        failing.set_failing(true);
        assert!(failing.put_remediation(&rec).await.is_err());
        // Reads keep working
        assert!(failing.get_remediation(&rec.id).await.unwrap().is_some());
    }
}
