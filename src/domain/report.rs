//! Per-site deployment reports and the run summary

use std::time::Duration;

use crate::error::{ReadinessTimeout, TeardownError};

use super::deployment::StrategyKind;

/// Outcome of the post-deployment readiness poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Site answered with a non-error status
    Ready {
        status: u16,
        attempts: u32,
        elapsed: Duration,
    },
    /// Deadline elapsed first (warning, not a failure)
    TimedOut(ReadinessTimeout),
    /// Poll abandoned because the run was cancelled
    Cancelled,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// What happened to one site
#[derive(Debug, Clone)]
pub struct DeployReport {
    pub site: String,
    pub url: String,
    pub strategy: StrategyKind,
    pub readiness: Readiness,
    pub duration: Duration,
}

/// Result of the teardown step
#[derive(Debug)]
pub enum TeardownOutcome {
    /// Resource group creation never succeeded
    NothingToCleanUp,
    Deleted { name: String },
    Failed(TeardownError),
}

impl TeardownOutcome {
    pub fn describe(&self) -> String {
        match self {
            Self::NothingToCleanUp => "nothing to clean up".to_string(),
            Self::Deleted { name } => format!("deleted {}", name),
            Self::Failed(e) => format!("failed: {}", e),
        }
    }
}

/// Everything the run did, regardless of how it ended
#[derive(Debug)]
pub struct RunSummary {
    pub resource_group: Option<String>,
    pub hosting_plan: Option<String>,
    pub sites_created: Vec<String>,
    pub reports: Vec<DeployReport>,
    pub teardown: TeardownOutcome,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self {
            resource_group: None,
            hosting_plan: None,
            sites_created: Vec::new(),
            reports: Vec::new(),
            teardown: TeardownOutcome::NothingToCleanUp,
        }
    }
}

impl RunSummary {
    /// Reports whose readiness poll timed out
    pub fn readiness_warnings(&self) -> impl Iterator<Item = &ReadinessTimeout> {
        self.reports.iter().filter_map(|r| match &r.readiness {
            Readiness::TimedOut(t) => Some(t),
            _ => None,
        })
    }
}
