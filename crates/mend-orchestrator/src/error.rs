//! Orchestrator error types

use mend_types::{RemediationId, SpecValidationError};
use thiserror::Error;

/// Orchestrator errors
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(#[from] SpecValidationError),

    #[error("remediation not found: {0}")]
    NotFound(RemediationId),

    #[error("invalid state: {current}, expected one of {expected:?}")]
    InvalidState {
        current: String,
        expected: Vec<String>,
    },

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<mend_registry::RegistryError> for OrchestratorError {
    fn from(err: mend_registry::RegistryError) -> Self {
        match err {
            mend_registry::RegistryError::UnknownAction(name) => {
                OrchestratorError::UnknownAction(name)
            }
            mend_registry::RegistryError::InvalidArguments(e) => {
                OrchestratorError::InvalidArguments(e)
            }
            mend_registry::RegistryError::DuplicateAction(kind) => {
                // Registration conflicts cannot arise from request handling.
                OrchestratorError::UnknownAction(kind.name().to_string())
            }
        }
    }
}

/// Result type for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;
