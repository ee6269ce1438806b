//! Services layer - orchestration logic
//!
//! This module coordinates between domain logic and infrastructure.
//! Services only see the infrastructure traits, never a concrete adapter.

pub mod dispatcher;
pub mod orchestrator;
pub mod provisioner;
pub mod readiness;
pub mod teardown;

#[cfg(test)]
pub mod testing;

// Re-export commonly used types
pub use dispatcher::DeploymentDispatcher;
pub use orchestrator::RunOrchestrator;
pub use readiness::{BackoffPolicy, ReadinessChecker};
