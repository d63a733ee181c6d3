//! The action catalog
//!
//! `builtin()` registers the seven remediation actions with their argument
//! schemas and risk tiers. Deployments that need a narrower surface start
//! from `new()` and register only what they allow.

use crate::error::{RegistryError, Result};
use dashmap::DashMap;
use mend_types::{ActionKind, ActionSpec, ArgKind, ArgSpec, Arguments, RiskTier};
use tracing::debug;

/// Maps each action to its spec
pub struct ActionRegistry {
    specs: DashMap<ActionKind, ActionSpec>,
}

impl ActionRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            specs: DashMap::new(),
        }
    }

    /// The full built-in catalog
    pub fn builtin() -> Self {
        let registry = Self::new();
        for spec in builtin_specs() {
            // Specs are distinct by construction
            let _ = registry.register(spec);
        }
        registry
    }

    /// Register a spec; fails if the action is already present
    pub fn register(&self, spec: ActionSpec) -> Result<()> {
        if self.specs.contains_key(&spec.kind) {
            return Err(RegistryError::DuplicateAction(spec.kind));
        }
        debug!(action = %spec.kind, risk = %spec.risk, "registered action");
        self.specs.insert(spec.kind, spec);
        Ok(())
    }

    /// Resolve an action's spec
    pub fn resolve(&self, kind: ActionKind) -> Option<ActionSpec> {
        self.specs.get(&kind).map(|s| s.clone())
    }

    /// Resolve by wire name, failing with `UnknownAction` on a miss.
    ///
    /// A name that parses but was never registered is also unknown: the
    /// registry, not the enum, is the allow-list.
    pub fn resolve_name(&self, name: &str) -> Result<ActionSpec> {
        ActionKind::parse(name)
            .and_then(|kind| self.resolve(kind))
            .ok_or_else(|| RegistryError::UnknownAction(name.to_string()))
    }

    /// Validate a request's arguments against the action's spec
    pub fn validate(&self, kind: ActionKind, arguments: &Arguments) -> Result<ActionSpec> {
        let spec = self
            .resolve(kind)
            .ok_or_else(|| RegistryError::UnknownAction(kind.name().to_string()))?;
        spec.validate_arguments(arguments)?;
        Ok(spec)
    }

    /// All registered specs
    pub fn specs(&self) -> Vec<ActionSpec> {
        self.specs.iter().map(|s| s.value().clone()).collect()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_specs() -> Vec<ActionSpec> {
    vec![
        ActionSpec {
            kind: ActionKind::RestartService,
            description: "Restart a service or application instance".into(),
            risk: RiskTier::Medium,
            args: vec![
                ArgSpec::required("resource_uri", ArgKind::String, "Resource to restart"),
                ArgSpec::optional(
                    "force",
                    ArgKind::Boolean,
                    "Force restart without graceful shutdown",
                ),
            ],
        },
        ActionSpec {
            kind: ActionKind::ScaleUp,
            description: "Scale up resources (add instances, increase capacity)".into(),
            risk: RiskTier::Medium,
            args: vec![
                ArgSpec::required("resource_uri", ArgKind::String, "Resource to scale"),
                ArgSpec::required(
                    "target_capacity",
                    ArgKind::Integer,
                    "Target number of instances or capacity units",
                ),
            ],
        },
        ActionSpec {
            kind: ActionKind::ScaleDown,
            description: "Scale down resources (remove instances, decrease capacity)".into(),
            risk: RiskTier::High,
            args: vec![
                ArgSpec::required("resource_uri", ArgKind::String, "Resource to scale down"),
                ArgSpec::required(
                    "target_capacity",
                    ArgKind::Integer,
                    "Target number of instances",
                ),
                ArgSpec::optional(
                    "drain_timeout",
                    ArgKind::Integer,
                    "Timeout for draining connections (seconds)",
                ),
            ],
        },
        ActionSpec {
            kind: ActionKind::ClearCache,
            description: "Clear cache to resolve stale data issues".into(),
            risk: RiskTier::Medium,
            args: vec![
                ArgSpec::required("cache_uri", ArgKind::String, "Cache resource URI"),
                ArgSpec::optional(
                    "pattern",
                    ArgKind::String,
                    "Key pattern to clear (supports wildcards)",
                ),
            ],
        },
        ActionSpec {
            kind: ActionKind::UpdateConfig,
            description: "Update configuration to resolve issues".into(),
            risk: RiskTier::High,
            args: vec![
                ArgSpec::required("resource_uri", ArgKind::String, "Resource to update"),
                ArgSpec::required(
                    "config_changes",
                    ArgKind::Object,
                    "Configuration changes to apply",
                ),
                ArgSpec::optional(
                    "restart_required",
                    ArgKind::Boolean,
                    "Whether restart is needed after config change",
                ),
            ],
        },
        ActionSpec {
            kind: ActionKind::RestartPod,
            description: "Restart a Kubernetes pod".into(),
            risk: RiskTier::Medium,
            args: vec![
                ArgSpec::required("pod_name", ArgKind::String, "Name of the pod to restart"),
                ArgSpec::optional("namespace", ArgKind::String, "Kubernetes namespace"),
            ],
        },
        ActionSpec {
            kind: ActionKind::KillProcess,
            description: "Kill a problematic process".into(),
            risk: RiskTier::Critical,
            args: vec![
                ArgSpec::required(
                    "resource_uri",
                    ArgKind::String,
                    "Resource where process is running",
                ),
                ArgSpec::required("process_id", ArgKind::Integer, "Process ID to kill"),
                ArgSpec::optional("signal", ArgKind::String, "Signal to send (SIGTERM, SIGKILL)"),
            ],
        },
    ]
}
