//! MEND Orchestrator - The remediation state machine
//!
//! The orchestrator turns a validated request into a tracked record and
//! drives it through the lifecycle: policy gate, optional approval gate,
//! bounded-retry execution with per-attempt timeouts, and automatic
//! rollback on failure when policy asks for it. Every transition is
//! written to the history ledger atomically with the in-memory update.
//!
//! ## Key Components
//!
//! - [`RemediationOrchestrator`]: submit / approve / reject / get / list
//! - [`ActionExecutor`]: collaborator seam performing the physical action
//! - [`RemediationService`]: facade wiring registry, snapshots, ledger,
//!   rollback manager, and orchestrator into one surface
//!
//! ## Example
//!
//! ```rust,no_run
//! use mend_orchestrator::RemediationService;
//! use mend_types::{Arguments, RemediationPolicy};
//!
//! # async fn example() {
//! let policy = RemediationPolicy {
//!     require_approval: false,
//!     ..Default::default()
//! };
//! let service = RemediationService::builder().policy(policy).build();
//!
//! let mut args = Arguments::new();
//! args.insert("resource_uri".into(), serde_json::json!("infra://aws/ec2/i-1"));
//!
//! let record = service
//!     .submit("restart_service", args, "operator-a", "oom loop")
//!     .await
//!     .unwrap();
//! println!("remediation {} is {}", record.id, record.status);
//! # }
//! ```

#![deny(unsafe_code)]

mod error;
mod executor;
mod orchestrator;
mod service;

pub use error::{OrchestratorError, Result};
pub use executor::{
    ActionExecutor, ExecutorError, FailingActionExecutor, FlakyActionExecutor,
    SlowActionExecutor, StaticActionExecutor,
};
pub use orchestrator::RemediationOrchestrator;
pub use service::{RemediationService, RemediationServiceBuilder};
