//! MEND Registry - Action catalog and request validation
//!
//! The registry is the allow-list of everything MEND can do. Each action
//! maps to an [`ActionSpec`](mend_types::ActionSpec) declaring required
//! arguments and a risk tier. Validation happens before any record is
//! created: a schema mismatch fails fast and produces no side effects.

#![deny(unsafe_code)]

mod catalog;
mod error;

pub use catalog::ActionRegistry;
pub use error::{RegistryError, Result};
