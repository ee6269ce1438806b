//! # Run Observability Module
//!
//! Structured run events for log collection.
//!
//! ## Event Flow
//!
//! ```text
//! appservice-provision → JSON stdout → Vector → Loki → Grafana
//! ```
//!
//! Events are JSON lines prefixed with `APPSERVICE_EVENT:`. Human-readable
//! progress goes through `tracing`; these lines are for machines.

use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::{DeployReport, Readiness, RunSummary};

/// Event prefix for Vector to identify structured events
const EVENT_PREFIX: &str = "APPSERVICE_EVENT:";

/// Run event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum RunEvent {
    /// Provisioning run started
    RunStarted(RunStartedEvent),
    /// One site deployed (ready or not)
    SiteDeployed(SiteDeployedEvent),
    /// Run finished without error
    RunCompleted(RunCompletedEvent),
    /// Run aborted
    RunFailed(RunFailedEvent),
}

/// Common fields for all events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Timestamp in RFC3339 format
    pub timestamp: String,
    /// Unique id of this run
    pub run_id: String,
    pub subscription_id: String,
    pub region: String,
    /// Hostname of the machine running the provisioner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// CI job ID if running in CI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci_job_id: Option<String>,
}

impl EventMetadata {
    pub fn new(subscription_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            run_id: uuid::Uuid::new_v4().to_string(),
            subscription_id: subscription_id.into(),
            region: region.into(),
            hostname: std::env::var("HOSTNAME").ok(),
            ci_job_id: std::env::var("GITHUB_RUN_ID")
                .ok()
                .or_else(|| std::env::var("CI_JOB_ID").ok()),
        }
    }

    /// Same run, fresh timestamp
    fn now(&self) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStartedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    /// Site name prefixes in deployment order
    pub sites: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteDeployedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    pub site: String,
    pub strategy: String,
    pub url: String,
    pub ready: bool,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCompletedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    /// Total duration in seconds
    pub duration_secs: f64,
    pub sites_created: usize,
    /// Sites that never answered before the readiness deadline
    pub readiness_warnings: usize,
    pub teardown: String,
    pub step_durations: Vec<StepDuration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFailedEvent {
    #[serde(flatten)]
    pub metadata: EventMetadata,
    /// Duration until failure
    pub duration_secs: f64,
    /// Step that failed
    pub failed_step: String,
    pub error: String,
    pub exit_code: u8,
    pub teardown: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDuration {
    pub step: String,
    pub duration_secs: f64,
    pub status: StepStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Failed,
}

/// Emits a structured event as JSON to stdout
pub fn emit_event(event: &RunEvent) {
    match serde_json::to_string(event) {
        Ok(json) => {
            println!("{}{}", EVENT_PREFIX, json);
        }
        Err(e) => {
            tracing::error!("Failed to serialize event: {}", e);
        }
    }
}

/// Helper to track step timing
pub struct StepTimer {
    name: String,
    start: Instant,
}

impl StepTimer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }

    fn finish_with(self, status: StepStatus) -> StepDuration {
        StepDuration {
            step: self.name,
            duration_secs: self.start.elapsed().as_secs_f64(),
            status,
        }
    }
}

/// Run tracker: step timings plus event emission
///
/// Events are collected in memory as well as printed, so callers (and
/// tests) can inspect what was emitted.
pub struct RunTracker {
    metadata: EventMetadata,
    start: Instant,
    steps: Vec<StepDuration>,
    current_step: Option<StepTimer>,
    events: Vec<RunEvent>,
    print: bool,
}

impl RunTracker {
    pub fn new(metadata: EventMetadata) -> Self {
        Self {
            metadata,
            start: Instant::now(),
            steps: Vec::new(),
            current_step: None,
            events: Vec::new(),
            print: true,
        }
    }

    /// Collect events without printing them
    pub fn silent(metadata: EventMetadata) -> Self {
        Self {
            print: false,
            ..Self::new(metadata)
        }
    }

    /// Start a new step, completing the previous one
    pub fn start_step(&mut self, name: impl Into<String>) {
        if let Some(timer) = self.current_step.take() {
            self.steps.push(timer.finish_with(StepStatus::Success));
        }
        self.current_step = Some(StepTimer::new(name));
    }

    pub fn into_events(self) -> Vec<RunEvent> {
        self.events
    }

    fn emit(&mut self, event: RunEvent) {
        if self.print {
            emit_event(&event);
        }
        self.events.push(event);
    }

    pub fn emit_started(&mut self, sites: Vec<String>) {
        let metadata = self.metadata.now();
        self.emit(RunEvent::RunStarted(RunStartedEvent { metadata, sites }));
    }

    pub fn emit_site_deployed(&mut self, report: &DeployReport) {
        let metadata = self.metadata.now();
        self.emit(RunEvent::SiteDeployed(SiteDeployedEvent {
            metadata,
            site: report.site.clone(),
            strategy: report.strategy.name().to_string(),
            url: report.url.clone(),
            ready: matches!(report.readiness, Readiness::Ready { .. }),
            duration_secs: report.duration.as_secs_f64(),
        }));
    }

    pub fn emit_completed(&mut self, summary: &RunSummary) {
        if let Some(timer) = self.current_step.take() {
            self.steps.push(timer.finish_with(StepStatus::Success));
        }

        let metadata = self.metadata.now();
        let event = RunEvent::RunCompleted(RunCompletedEvent {
            metadata,
            duration_secs: self.start.elapsed().as_secs_f64(),
            sites_created: summary.sites_created.len(),
            readiness_warnings: summary.readiness_warnings().count(),
            teardown: summary.teardown.describe(),
            step_durations: self.steps.clone(),
        });
        self.emit(event);
    }

    pub fn emit_failed(&mut self, error: String, exit_code: u8, summary: &RunSummary) {
        let failed_step = match self.current_step.take() {
            Some(timer) => {
                let step = timer.finish_with(StepStatus::Failed);
                let name = step.step.clone();
                self.steps.push(step);
                name
            }
            None => "unknown".to_string(),
        };

        let metadata = self.metadata.now();
        self.emit(RunEvent::RunFailed(RunFailedEvent {
            metadata,
            duration_secs: self.start.elapsed().as_secs_f64(),
            failed_step,
            error,
            exit_code,
            teardown: summary.teardown.describe(),
        }));
    }
}
