//! Action executor seam
//!
//! The executor performs the physical side effect of one action invocation
//! against the real infrastructure. It may be slow or fail; the
//! orchestrator bounds every call with the policy's per-attempt timeout
//! and retries per policy.

use async_trait::async_trait;
use mend_types::{ActionKind, Arguments, ExecutionOutcome};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Executor-reported failure
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("execution failed: {0}")]
    Failed(String),
}

/// Performs the physical side effect for one action invocation
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Execute the action with the given arguments
    async fn execute(
        &self,
        action: ActionKind,
        arguments: &Arguments,
    ) -> std::result::Result<ExecutionOutcome, ExecutorError>;
}

/// Executor that succeeds immediately with a canned detail payload,
/// for testing and development
pub struct StaticActionExecutor {
    detail: serde_json::Value,
}

impl StaticActionExecutor {
    /// Executor returning the given detail payload for every action
    pub fn new(detail: serde_json::Value) -> Self {
        Self { detail }
    }
}

impl Default for StaticActionExecutor {
    fn default() -> Self {
        Self::new(serde_json::json!({
            "resources_affected": 1,
            "health_check_passed": true,
        }))
    }
}

#[async_trait]
impl ActionExecutor for StaticActionExecutor {
    async fn execute(
        &self,
        action: ActionKind,
        _arguments: &Arguments,
    ) -> std::result::Result<ExecutionOutcome, ExecutorError> {
        debug!(action = %action, "static executor applying action");
        Ok(ExecutionOutcome::success(
            format!("{} applied", action),
            self.detail.clone(),
        ))
    }
}

/// Executor that always fails, for testing
pub struct FailingActionExecutor;

#[async_trait]
impl ActionExecutor for FailingActionExecutor {
    async fn execute(
        &self,
        action: ActionKind,
        _arguments: &Arguments,
    ) -> std::result::Result<ExecutionOutcome, ExecutorError> {
        Err(ExecutorError::Failed(format!(
            "simulated failure executing {}",
            action
        )))
    }
}

/// Executor that fails a fixed number of times, then succeeds.
///
/// Exercises the retry path: with `failures = 2` and `max_retries = 2`,
/// the third attempt wins.
pub struct FlakyActionExecutor {
    remaining_failures: AtomicU32,
}

impl FlakyActionExecutor {
    /// Executor that fails `failures` times before succeeding
    pub fn new(failures: u32) -> Self {
        Self {
            remaining_failures: AtomicU32::new(failures),
        }
    }
}

#[async_trait]
impl ActionExecutor for FlakyActionExecutor {
    async fn execute(
        &self,
        action: ActionKind,
        _arguments: &Arguments,
    ) -> std::result::Result<ExecutionOutcome, ExecutorError> {
        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ExecutorError::Failed(format!(
                "transient failure executing {}",
                action
            )));
        }
        Ok(ExecutionOutcome::success(
            format!("{} applied", action),
            serde_json::json!({"attempts_needed": "several"}),
        ))
    }
}

/// Executor that sleeps before succeeding, for timeout tests
pub struct SlowActionExecutor {
    delay: Duration,
}

impl SlowActionExecutor {
    /// Executor that sleeps `delay` before answering
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ActionExecutor for SlowActionExecutor {
    async fn execute(
        &self,
        action: ActionKind,
        _arguments: &Arguments,
    ) -> std::result::Result<ExecutionOutcome, ExecutorError> {
        tokio::time::sleep(self.delay).await;
        Ok(ExecutionOutcome::success(
            format!("{} applied (slowly)", action),
            serde_json::Value::Null,
        ))
    }
}
