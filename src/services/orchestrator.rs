//! End-to-end provisioning run
//!
//! create resource group → for each site in order: create site (first one
//! allocates the plan), deploy, wait for readiness → teardown.
//!
//! Teardown is not part of the fallible flow: it runs after the flow
//! returns, whatever it returned, and it runs outside the cancellation
//! token so a Ctrl-C still removes the group.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::dispatcher::DeploymentDispatcher;
use super::provisioner::Provisioner;
use super::teardown::TeardownGuarantor;
use crate::config::RunPlan;
use crate::domain::{NameGenerator, ResourceGroupHandle, RunSummary};
use crate::error::RunError;
use crate::infrastructure::CloudProvider;
use crate::observability::{RunEvent, RunTracker};

/// Summary of everything that happened, plus the run's verdict
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: RunSummary,
    /// First error that aborted the run; teardown never changes it
    pub result: Result<(), RunError>,
    /// Structured events emitted by the tracker, if one was attached
    pub events: Vec<RunEvent>,
}

pub struct RunOrchestrator {
    provider: Arc<dyn CloudProvider>,
    dispatcher: DeploymentDispatcher,
    teardown: TeardownGuarantor,
    names: NameGenerator,
    tracker: Option<RunTracker>,
}

impl RunOrchestrator {
    pub fn new(provider: Arc<dyn CloudProvider>, dispatcher: DeploymentDispatcher) -> Self {
        Self {
            teardown: TeardownGuarantor::new(provider.clone()),
            provider,
            dispatcher,
            names: NameGenerator::new(),
            tracker: None,
        }
    }

    pub fn with_name_generator(mut self, names: NameGenerator) -> Self {
        self.names = names;
        self
    }

    pub fn with_tracker(mut self, tracker: RunTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub async fn run(mut self, plan: &RunPlan, cancel: &CancellationToken) -> RunOutcome {
        let provisioner = Provisioner::new(self.provider.clone());
        let mut summary = RunSummary::default();
        let mut group: Option<ResourceGroupHandle> = None;

        if let Some(tracker) = self.tracker.as_mut() {
            tracker.emit_started(plan.sites.iter().map(|s| s.name_prefix.clone()).collect());
        }

        let result = self
            .provision_and_deploy(plan, cancel, &provisioner, &mut group, &mut summary)
            .await;

        summary.hosting_plan = provisioner.hosting_plan().map(|p| p.to_string());

        if let Err(e) = &result {
            warn!("Run aborted: {}", e);
        }

        if let Some(tracker) = self.tracker.as_mut() {
            tracker.start_step("teardown");
        }
        summary.teardown = self.teardown.teardown(group.as_ref()).await;

        if let Some(tracker) = self.tracker.as_mut() {
            match &result {
                Ok(()) => tracker.emit_completed(&summary),
                Err(e) => tracker.emit_failed(e.to_string(), e.exit_code(), &summary),
            }
        }

        let events = self
            .tracker
            .take()
            .map(RunTracker::into_events)
            .unwrap_or_default();

        RunOutcome {
            summary,
            result,
            events,
        }
    }

    fn step(&mut self, name: String) {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.start_step(name);
        }
    }

    async fn provision_and_deploy(
        &mut self,
        plan: &RunPlan,
        cancel: &CancellationToken,
        provisioner: &Provisioner,
        group_slot: &mut Option<ResourceGroupHandle>,
        summary: &mut RunSummary,
    ) -> Result<(), RunError> {
        ensure_active(cancel)?;

        let group_name = self.names.resource_group_name(&plan.resource_group_prefix)?;
        self.step(format!("create resource group {}", group_name));

        // Not raced against cancellation: an abandoned request could leave a
        // group behind that nobody knows the handle of
        let group = provisioner
            .create_resource_group(&group_name, &plan.region)
            .await?;
        summary.resource_group = Some(group.name.clone());
        let group = group_slot.insert(group);

        for site_plan in &plan.sites {
            ensure_active(cancel)?;

            let site_name = self.names.site_name(&site_plan.name_prefix)?;
            self.step(format!("create site {}", site_name));

            let site = cancellable(cancel, provisioner.create_site(group, &site_name, site_plan))
                .await??;
            summary.sites_created.push(site.name.clone());

            self.step(format!("deploy {}", site.name));
            let report = cancellable(
                cancel,
                self.dispatcher.deploy(
                    group,
                    &site,
                    &site_plan.deployment,
                    site_plan.warmup_path.as_deref(),
                    cancel,
                ),
            )
            .await?
            .map_err(|source| RunError::Deploy {
                site: site.name.clone(),
                source,
            })?;

            info!(
                site = %report.site,
                strategy = %report.strategy,
                ready = report.readiness.is_ready(),
                "Site deployed"
            );
            if let Some(tracker) = self.tracker.as_mut() {
                tracker.emit_site_deployed(&report);
            }
            summary.reports.push(report);
        }

        ensure_active(cancel)
    }
}

fn ensure_active(cancel: &CancellationToken) -> Result<(), RunError> {
    if cancel.is_cancelled() {
        Err(RunError::Cancelled)
    } else {
        Ok(())
    }
}

/// Race `fut` against the token; the future is dropped on cancellation
async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, RunError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RunError::Cancelled),
        output = fut => Ok(output),
    }
}
