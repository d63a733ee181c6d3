//! Registry error types

use mend_types::{ActionKind, SpecValidationError};
use thiserror::Error;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(#[from] SpecValidationError),

    #[error("action already registered: {0}")]
    DuplicateAction(ActionKind),
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
