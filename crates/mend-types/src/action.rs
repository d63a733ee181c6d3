//! Action catalog types
//!
//! The set of remediation actions is a closed enum resolved through the
//! action registry. Each action declares the arguments it requires and a
//! risk tier that policy uses to decide whether a pre-change snapshot is
//! captured.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Named arguments for one action invocation
pub type Arguments = BTreeMap<String, serde_json::Value>;

/// The closed set of remediation actions MEND can orchestrate
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Restart a service or application instance
    RestartService,
    /// Add instances or increase capacity
    ScaleUp,
    /// Remove instances or decrease capacity
    ScaleDown,
    /// Clear a cache to resolve stale data
    ClearCache,
    /// Apply configuration changes
    UpdateConfig,
    /// Restart a Kubernetes pod
    RestartPod,
    /// Kill a problematic process
    KillProcess,
}

impl ActionKind {
    /// Stable wire name for this action
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::RestartService => "restart_service",
            ActionKind::ScaleUp => "scale_up",
            ActionKind::ScaleDown => "scale_down",
            ActionKind::ClearCache => "clear_cache",
            ActionKind::UpdateConfig => "update_config",
            ActionKind::RestartPod => "restart_pod",
            ActionKind::KillProcess => "kill_process",
        }
    }

    /// Resolve an action by its wire name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "restart_service" => Some(ActionKind::RestartService),
            "scale_up" => Some(ActionKind::ScaleUp),
            "scale_down" => Some(ActionKind::ScaleDown),
            "clear_cache" => Some(ActionKind::ClearCache),
            "update_config" => Some(ActionKind::UpdateConfig),
            "restart_pod" => Some(ActionKind::RestartPod),
            "kill_process" => Some(ActionKind::KillProcess),
            _ => None,
        }
    }

    /// All catalog actions
    pub fn all() -> &'static [ActionKind] {
        &[
            ActionKind::RestartService,
            ActionKind::ScaleUp,
            ActionKind::ScaleDown,
            ActionKind::ClearCache,
            ActionKind::UpdateConfig,
            ActionKind::RestartPod,
            ActionKind::KillProcess,
        ]
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Risk tier of an action, ordered from least to most dangerous
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::Low => write!(f, "low"),
            RiskTier::Medium => write!(f, "medium"),
            RiskTier::High => write!(f, "high"),
            RiskTier::Critical => write!(f, "critical"),
        }
    }
}

/// Expected type of a declared argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    String,
    Integer,
    Boolean,
    Object,
}

impl ArgKind {
    /// Whether a JSON value matches this kind
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            ArgKind::String => value.is_string(),
            ArgKind::Integer => value.is_i64() || value.is_u64(),
            ArgKind::Boolean => value.is_boolean(),
            ArgKind::Object => value.is_object(),
        }
    }
}

/// Declaration of one named argument an action accepts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgSpec {
    /// Argument name
    pub name: String,

    /// Expected value type
    pub kind: ArgKind,

    /// Whether the argument must be present
    pub required: bool,

    /// What the argument means
    pub description: String,
}

impl ArgSpec {
    /// Declare a required argument
    pub fn required(name: impl Into<String>, kind: ArgKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: description.into(),
        }
    }

    /// Declare an optional argument
    pub fn optional(name: impl Into<String>, kind: ArgKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: description.into(),
        }
    }
}

/// What an action needs and how dangerous it is
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSpec {
    /// The action this spec describes
    pub kind: ActionKind,

    /// Human-readable description
    pub description: String,

    /// Risk tier driving snapshot and approval behavior
    pub risk: RiskTier,

    /// Declared arguments
    pub args: Vec<ArgSpec>,
}

/// Argument validation failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpecValidationError {
    #[error("action '{action}' requires argument '{name}'")]
    MissingArgument { action: ActionKind, name: String },

    #[error("argument '{name}' of action '{action}' has the wrong type (expected {expected:?})")]
    InvalidArgumentType {
        action: ActionKind,
        name: String,
        expected: ArgKind,
    },
}

impl ActionSpec {
    /// Validate a request's arguments against this spec.
    ///
    /// Required arguments must be present, and every declared argument that
    /// is present must match its declared type. Undeclared arguments are
    /// ignored rather than rejected so executors can accept extras.
    pub fn validate_arguments(&self, arguments: &Arguments) -> Result<(), SpecValidationError> {
        for arg in &self.args {
            match arguments.get(&arg.name) {
                None => {
                    if arg.required {
                        return Err(SpecValidationError::MissingArgument {
                            action: self.kind,
                            name: arg.name.clone(),
                        });
                    }
                }
                Some(value) => {
                    if !arg.kind.matches(value) {
                        return Err(SpecValidationError::InvalidArgumentType {
                            action: self.kind,
                            name: arg.name.clone(),
                            expected: arg.kind,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// The resource an invocation targets, when its arguments name one.
///
/// Most actions address a `resource_uri`; cache clears address a
/// `cache_uri` and pod restarts a `pod_name`.
pub fn resource_argument(arguments: &Arguments) -> Option<&str> {
    for key in ["resource_uri", "cache_uri", "deployment_uri", "pod_name"] {
        if let Some(value) = arguments.get(key).and_then(|v| v.as_str()) {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec() -> ActionSpec {
        ActionSpec {
            kind: ActionKind::ScaleUp,
            description: "Scale up resources".into(),
            risk: RiskTier::Medium,
            args: vec![
                ArgSpec::required("resource_uri", ArgKind::String, "Resource to scale"),
                ArgSpec::required("target_capacity", ArgKind::Integer, "Target capacity"),
            ],
        }
    }

    #[test]
    fn test_parse_roundtrip() {
        for kind in ActionKind::all() {
            assert_eq!(ActionKind::parse(kind.name()), Some(*kind));
        }
        assert_eq!(ActionKind::parse("reboot_universe"), None);
    }

    #[test]
    fn test_validate_ok() {
        let mut args = Arguments::new();
        args.insert("resource_uri".into(), json!("infra://aws/ec2/i-12345"));
        args.insert("target_capacity".into(), json!(5));
        assert!(spec().validate_arguments(&args).is_ok());
    }

    #[test]
    fn test_validate_missing_required() {
        let mut args = Arguments::new();
        args.insert("resource_uri".into(), json!("infra://aws/ec2/i-12345"));
        let err = spec().validate_arguments(&args).unwrap_err();
        assert!(matches!(err, SpecValidationError::MissingArgument { .. }));
    }

    #[test]
    fn test_validate_wrong_type() {
        let mut args = Arguments::new();
        args.insert("resource_uri".into(), json!("infra://aws/ec2/i-12345"));
        args.insert("target_capacity".into(), json!("five"));
        let err = spec().validate_arguments(&args).unwrap_err();
        assert!(matches!(
            err,
            SpecValidationError::InvalidArgumentType { expected: ArgKind::Integer, .. }
        ));
    }

    #[test]
    fn test_risk_tier_ordering() {
        assert!(RiskTier::Low < RiskTier::Medium);
        assert!(RiskTier::High < RiskTier::Critical);
    }

    #[test]
    fn test_resource_argument() {
        let mut args = Arguments::new();
        args.insert("resource_uri".into(), json!("infra://aws/ec2/i-12345"));
        assert_eq!(resource_argument(&args), Some("infra://aws/ec2/i-12345"));

        let mut args = Arguments::new();
        args.insert("pod_name".into(), json!("web-7d9c"));
        assert_eq!(resource_argument(&args), Some("web-7d9c"));

        assert_eq!(resource_argument(&Arguments::new()), None);
    }
}
