//! CLI definitions for appservice-provision
//!
//! This module contains all CLI argument parsing structures using clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "appservice-provision",
    version,
    about = "Provision App Service sites, deploy them, and tear everything down",
    long_about = "Creates a resource group, a shared hosting plan and one site per plan entry,\n\
                  deploys each site (FTP upload, local Git push, public repository binding),\n\
                  waits for the sites to answer, then deletes the resource group again.\n\n\
                  Without --plan the built-in sample plan runs. It reads assets/helloworld.war\n\
                  and azure-samples-appservice-helloworld/ relative to the working directory,\n\
                  so start it from the repository root."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision, deploy, verify and tear down
    Run(RunArgs),

    /// Validate a run plan without contacting the cloud
    Validate {
        /// Run plan file (YAML); the built-in sample plan when omitted
        #[arg(long)]
        plan: Option<PathBuf>,
    },

    /// Print the built-in sample plan as YAML
    SamplePlan,
}

#[derive(Args)]
pub struct RunArgs {
    /// Service principal application (client) id
    #[arg(long, env = "CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// Service principal secret
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Directory (tenant) id
    #[arg(long, env = "TENANT_ID", hide_env_values = true)]
    pub tenant_id: Option<String>,

    /// Subscription to provision in
    #[arg(long, env = "SUBSCRIPTION_ID", hide_env_values = true)]
    pub subscription_id: Option<String>,

    /// Run plan file (YAML); the built-in sample plan when omitted
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Override the plan's region
    #[arg(long)]
    pub region: Option<String>,

    /// Override how long to wait for each site to answer (e.g. "90s", "3m")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub readiness_timeout: Option<Duration>,

    /// Do not print structured APPSERVICE_EVENT lines
    #[arg(long)]
    pub no_events: bool,
}
