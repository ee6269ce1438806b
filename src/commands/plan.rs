//! Offline plan commands: `validate` and `sample-plan`

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::RunPlan;
use crate::error::{ConfigError, RunError};
use crate::ui;

/// Load the plan at `path`, or the built-in sample when no path is given
pub fn load_plan(path: Option<&Path>) -> Result<RunPlan, ConfigError> {
    match path {
        Some(path) => {
            info!("Loading run plan from {}", path.display());
            RunPlan::load(path)
        }
        None => {
            info!("No --plan given, using the built-in sample plan");
            Ok(RunPlan::sample())
        }
    }
}

pub fn validate(path: Option<&Path>) -> Result<ExitCode> {
    let checked = load_plan(path).and_then(|plan| {
        plan.validate()?;
        plan.check_local_inputs()?;
        Ok(plan)
    });

    match checked {
        Ok(plan) => {
            ui::print_success(&format!(
                "Plan is valid: {} site(s) in {}",
                plan.sites.len(),
                plan.region
            ));
            for site in &plan.sites {
                ui::print_info(&format!(
                    "{:<12} {}",
                    site.name_prefix,
                    site.deployment.kind()
                ));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let err = RunError::from(e);
            ui::print_error(&err.to_string());
            Ok(ExitCode::from(err.exit_code()))
        }
    }
}

pub fn print_sample() -> Result<ExitCode> {
    let yaml =
        serde_yaml::to_string(&RunPlan::sample()).context("Failed to render sample plan")?;
    print!("{}", yaml);
    Ok(ExitCode::SUCCESS)
}
