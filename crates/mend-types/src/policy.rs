//! Remediation governance policy
//!
//! Process-wide configuration loaded once at startup and read-only
//! thereafter. Policy decides which actions pass the gate, whether a human
//! must approve, how execution is retried, and when state is snapshotted
//! and rolled back.

use crate::{ActionKind, RiskTier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Governance settings for the remediation orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationPolicy {
    /// Actions allowed to execute. An empty set means no restriction:
    /// every registry action is allowed.
    pub allowed_actions: BTreeSet<ActionKind>,

    /// Whether submissions park in `awaiting_approval` until approved
    pub require_approval: bool,

    /// Additional attempts after the first failure
    pub max_retries: u32,

    /// Fixed delay between attempts
    #[serde(with = "duration_serde")]
    pub retry_backoff: Duration,

    /// Per-attempt executor timeout
    #[serde(with = "duration_serde")]
    pub execution_timeout: Duration,

    /// Whether a failed remediation triggers automatic rollback
    pub rollback_on_failure: bool,

    /// How long snapshots are retained
    #[serde(with = "duration_serde")]
    pub snapshot_retention: Duration,

    /// Whether to capture a pre-change snapshot for risky actions
    pub snapshot_before_risky: bool,

    /// Risk tier at or above which the pre-change snapshot is captured
    pub risky_tier: RiskTier,
}

impl Default for RemediationPolicy {
    fn default() -> Self {
        Self {
            allowed_actions: BTreeSet::new(),
            require_approval: true,
            max_retries: 3,
            retry_backoff: Duration::from_secs(1),
            execution_timeout: Duration::from_secs(30),
            rollback_on_failure: true,
            snapshot_retention: Duration::from_secs(7 * 24 * 60 * 60),
            snapshot_before_risky: true,
            risky_tier: RiskTier::High,
        }
    }
}

impl RemediationPolicy {
    /// Whether the allow-list permits this action
    pub fn is_action_allowed(&self, action: ActionKind) -> bool {
        self.allowed_actions.is_empty() || self.allowed_actions.contains(&action)
    }

    /// Whether policy wants a pre-change snapshot for this risk tier
    pub fn wants_snapshot(&self, risk: RiskTier) -> bool {
        self.snapshot_before_risky && risk >= self.risky_tier
    }

    /// Total attempt cap, counting the first attempt
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Serde helper for Duration
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
