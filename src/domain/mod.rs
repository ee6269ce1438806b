//! Domain layer - pure business logic
//!
//! This module contains business logic with no external I/O.
//! Types and functions here can be unit tested without mocking.

pub mod deployment;
pub mod naming;
pub mod report;
pub mod site;

// Re-export commonly used types
pub use deployment::{
    DeploymentDescriptor, PublishingCredentials, PublishingFormat, PublishingProfile,
    SourceControlBinding,
};
pub use naming::NameGenerator;
pub use report::{DeployReport, Readiness, RunSummary, TeardownOutcome};
pub use site::{AppSetting, HostingPlanId, ResourceGroupHandle, SiteHandle, SiteRequest};
