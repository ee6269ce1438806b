//! `run`: provision, deploy, verify, tear down

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::plan::load_plan;
use crate::cli::RunArgs;
use crate::config::{ProviderCredentials, RunPlan};
use crate::domain::DeploymentDescriptor;
use crate::error::{ConfigError, RunError};
use crate::infrastructure::{ArmProvider, CurlFtpUploader, GitPusher, HttpReadinessProbe};
use crate::observability::{EventMetadata, RunTracker};
use crate::services::{BackoffPolicy, DeploymentDispatcher, ReadinessChecker, RunOrchestrator};
use crate::tools::{require_tool, tools};
use crate::ui;

pub async fn execute(args: RunArgs) -> Result<ExitCode> {
    ui::print_header("App Service Provisioning");

    let (plan, credentials) = match prepare(&args) {
        Ok(prepared) => prepared,
        Err(e) => {
            let err = RunError::from(e);
            ui::print_error(&err.to_string());
            return Ok(ExitCode::from(err.exit_code()));
        }
    };

    info!(
        region = %plan.region,
        sites = plan.sites.len(),
        "Provisioning {} site(s)",
        plan.sites.len()
    );

    let provider = Arc::new(ArmProvider::new(plan.provider.clone(), credentials)?);
    info!(subscription = %provider.subscription_id(), "Selected subscription");
    let probe = Arc::new(HttpReadinessProbe::new(plan.readiness.request_timeout())?);

    let dispatcher = DeploymentDispatcher::new(
        provider.clone(),
        Arc::new(CurlFtpUploader::new()),
        Arc::new(GitPusher::new()),
        ReadinessChecker::new(probe, BackoffPolicy::from(&plan.readiness)),
    );

    let metadata = EventMetadata::new(provider.subscription_id(), plan.region.clone());
    let mut orchestrator = RunOrchestrator::new(provider, dispatcher);
    if !args.no_events {
        orchestrator = orchestrator.with_tracker(RunTracker::new(metadata));
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling run (the resource group is still deleted)");
            interrupt.cancel();
        }
    });

    let outcome = orchestrator.run(&plan, &cancel).await;
    ui::print_summary(&outcome.summary);

    match outcome.result {
        Ok(()) => {
            ui::print_success("Run completed");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            ui::print_error(&e.to_string());
            Ok(ExitCode::from(e.exit_code()))
        }
    }
}

/// Everything that can fail before a single cloud call is made
fn prepare(args: &RunArgs) -> Result<(RunPlan, ProviderCredentials), ConfigError> {
    let credentials = ProviderCredentials::from_parts(
        args.client_id
            .clone()
            .or_else(|| std::env::var("AZURE_CLIENT_ID").ok()),
        args.client_secret.clone(),
        args.tenant_id.clone(),
        args.subscription_id.clone(),
    )?;

    let mut plan = load_plan(args.plan.as_deref())?;
    if let Some(region) = &args.region {
        plan.region = region.clone();
    }
    if let Some(timeout) = args.readiness_timeout {
        plan.readiness.max_wait_secs = timeout.as_secs().max(1);
    }

    plan.validate()?;
    plan.check_local_inputs()?;
    check_tools(&plan)?;

    Ok((plan, credentials))
}

/// External binaries needed by the plan's strategies
fn required_tools(plan: &RunPlan) -> Vec<&'static str> {
    let mut needed = Vec::new();
    for site in &plan.sites {
        let tool = match site.deployment {
            DeploymentDescriptor::FileTransfer { .. } => tools::CURL,
            DeploymentDescriptor::LocalVersionControl { .. } => tools::GIT,
            DeploymentDescriptor::ExternalRepository { .. } => continue,
        };
        if !needed.contains(&tool) {
            needed.push(tool);
        }
    }
    needed
}

fn check_tools(plan: &RunPlan) -> Result<(), ConfigError> {
    for tool in required_tools(plan) {
        require_tool(tool).map_err(|e| ConfigError::InvalidValue {
            field: "tools".to_string(),
            value: e.to_string(),
        })?;
    }
    Ok(())
}
