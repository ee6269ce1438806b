//! Run plan: which sites to create and how each one is deployed
//!
//! Loaded from YAML when `--plan` is given, otherwise [`RunPlan::sample`]
//! reproduces the classic four-site walkthrough (FTP, local Git, public
//! repository, repository with continuous integration).

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{AppSetting, DeploymentDescriptor};
use crate::error::ConfigError;
use crate::validation::{
    validate_numeric_range, validate_repository_url, validate_resource_group_name,
    validate_site_name,
};

/// Stand-in for the random suffix when validating prefixes
const SUFFIX_PLACEHOLDER: &str = "0a1b2c3d";

/// Tomcat launcher that serves `webapps/` out of the persistent wwwroot
const TOMCAT_STARTUP_COMMAND: &str = r#"/bin/bash -c "sed -ie 's/appBase=\"webapps\"/appBase=\"\\/home\\/site\\/wwwroot\\/webapps\"/g' conf/server.xml && catalina.sh run""#;

/// Complete description of one provisioning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPlan {
    /// Region for the resource group and every site
    #[serde(default = "default_region")]
    pub region: String,

    /// Prefix of the generated resource group name
    #[serde(default = "default_resource_group_prefix")]
    pub resource_group_prefix: String,

    /// Readiness polling after each deployment
    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Provider endpoints and long-running operation polling
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Sites in deployment order
    pub sites: Vec<SitePlan>,
}

/// One site and its deployment strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitePlan {
    /// Prefix of the generated site name, e.g. `webapp1-`
    pub name_prefix: String,

    /// Application settings
    #[serde(default = "default_app_settings")]
    pub app_settings: Vec<AppSetting>,

    /// Startup command line
    #[serde(default = "default_startup_command")]
    pub startup_command: Option<String>,

    /// Runtime stack (Linux FX version)
    #[serde(default = "default_runtime_stack")]
    pub runtime_stack: Option<String>,

    /// Path appended to the site URL for the readiness probe
    #[serde(default)]
    pub warmup_path: Option<String>,

    /// Deployment strategy
    pub deployment: DeploymentDescriptor,
}

/// Readiness polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    /// Give up (with a warning) after this many seconds (default: 120, range: 1-3600)
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,

    /// First delay between probes in milliseconds (default: 1000, range: 1-60000)
    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,

    /// Backoff ceiling in seconds (default: 15, range: 1-300)
    #[serde(default = "default_max_interval_secs")]
    pub max_interval_secs: u64,

    /// Per-request timeout in seconds (default: 10, range: 1-120)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ReadinessConfig {
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_secs(self.max_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> anyhow::Result<()> {
        validate_numeric_range(self.max_wait_secs, "readiness.max_wait_secs", 1, 3600)?;
        validate_numeric_range(
            self.initial_interval_ms,
            "readiness.initial_interval_ms",
            1,
            60_000,
        )?;
        validate_numeric_range(self.max_interval_secs, "readiness.max_interval_secs", 1, 300)?;
        validate_numeric_range(
            self.request_timeout_secs,
            "readiness.request_timeout_secs",
            1,
            120,
        )?;
        Ok(())
    }
}

/// Provider endpoints and operation polling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Resource management endpoint
    #[serde(default = "default_management_endpoint")]
    pub management_endpoint: String,

    /// Identity endpoint issuing client-credential tokens
    #[serde(default = "default_authority_host")]
    pub authority_host: String,

    /// HTTP request timeout in seconds (default: 60, range: 5-300)
    #[serde(default = "default_provider_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Delay between long-running operation polls when the provider gives no hint (default: 5)
    #[serde(default = "default_operation_poll_interval_secs")]
    pub operation_poll_interval_secs: u64,

    /// Maximum polls per long-running operation (default: 120, range: 1-1000)
    #[serde(default = "default_operation_max_polls")]
    pub operation_max_polls: u32,

    /// Hosting plan SKU name
    #[serde(default = "default_plan_sku")]
    pub plan_sku: String,

    /// Hosting plan SKU tier
    #[serde(default = "default_plan_tier")]
    pub plan_tier: String,
}

impl ProviderSettings {
    fn validate(&self) -> anyhow::Result<()> {
        for (field, url) in [
            ("provider.management_endpoint", &self.management_endpoint),
            ("provider.authority_host", &self.authority_host),
        ] {
            reqwest::Url::parse(url)
                .map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", field, e))?;
        }

        validate_numeric_range(
            self.request_timeout_secs,
            "provider.request_timeout_secs",
            5,
            300,
        )?;
        validate_numeric_range(
            self.operation_poll_interval_secs,
            "provider.operation_poll_interval_secs",
            0,
            60,
        )?;
        validate_numeric_range(
            self.operation_max_polls as u64,
            "provider.operation_max_polls",
            1,
            1000,
        )?;

        if self.plan_sku.trim().is_empty() {
            anyhow::bail!("provider.plan_sku cannot be empty");
        }

        Ok(())
    }
}

impl RunPlan {
    /// The four-site walkthrough
    pub fn sample() -> Self {
        let site = |prefix: &str, warmup: Option<&str>, deployment| SitePlan {
            name_prefix: prefix.to_string(),
            app_settings: default_app_settings(),
            startup_command: default_startup_command(),
            runtime_stack: default_runtime_stack(),
            warmup_path: warmup.map(String::from),
            deployment,
        };

        Self {
            region: default_region(),
            resource_group_prefix: default_resource_group_prefix(),
            readiness: ReadinessConfig::default(),
            provider: ProviderSettings::default(),
            sites: vec![
                site(
                    "webapp1-",
                    Some("/helloworld"),
                    DeploymentDescriptor::FileTransfer {
                        artifact_path: "assets/helloworld.war".into(),
                    },
                ),
                site(
                    "webapp2-",
                    Some("/helloworld"),
                    DeploymentDescriptor::LocalVersionControl {
                        source_dir: "azure-samples-appservice-helloworld".into(),
                        branch: "master".into(),
                    },
                ),
                site(
                    "webapp3-",
                    None,
                    DeploymentDescriptor::ExternalRepository {
                        url: "https://github.com/azure-appservice-samples/java-get-started"
                            .into(),
                        branch: "master".into(),
                        continuous_integration: false,
                    },
                ),
                site(
                    "webapp4-",
                    None,
                    DeploymentDescriptor::ExternalRepository {
                        url: "https://github.com/Azure-Samples/app-service-web-java-get-started"
                            .into(),
                        branch: "master".into(),
                        continuous_integration: true,
                    },
                ),
            ],
        }
    }

    /// Load a plan from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }

    /// Check every value that can be checked without touching the network
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_inner().map_err(|e| ConfigError::InvalidValue {
            field: "plan".to_string(),
            value: e.to_string(),
        })
    }

    fn validate_inner(&self) -> anyhow::Result<()> {
        if self.region.trim().is_empty() {
            anyhow::bail!("region cannot be empty");
        }

        validate_resource_group_name(&format!(
            "{}{}",
            self.resource_group_prefix, SUFFIX_PLACEHOLDER
        ))?;

        if self.sites.is_empty() {
            anyhow::bail!("at least one site is required");
        }

        let mut prefixes = HashSet::new();
        for site in &self.sites {
            validate_site_name(&format!("{}{}", site.name_prefix, SUFFIX_PLACEHOLDER))
                .map_err(|e| anyhow::anyhow!("name_prefix '{}': {}", site.name_prefix, e))?;

            if !prefixes.insert(site.name_prefix.to_lowercase()) {
                anyhow::bail!("duplicate site name_prefix '{}'", site.name_prefix);
            }

            if site.app_settings.iter().any(|s| s.name.trim().is_empty()) {
                anyhow::bail!("site '{}' has an app setting without a name", site.name_prefix);
            }

            match &site.deployment {
                DeploymentDescriptor::FileTransfer { artifact_path } => {
                    if artifact_path.file_name().is_none() {
                        anyhow::bail!(
                            "site '{}': artifact_path must name a file",
                            site.name_prefix
                        );
                    }
                }
                DeploymentDescriptor::LocalVersionControl { branch, .. } => {
                    if branch.trim().is_empty() {
                        anyhow::bail!("site '{}': branch cannot be empty", site.name_prefix);
                    }
                }
                DeploymentDescriptor::ExternalRepository { url, branch, .. } => {
                    validate_repository_url(url)?;
                    if branch.trim().is_empty() {
                        anyhow::bail!("site '{}': branch cannot be empty", site.name_prefix);
                    }
                }
            }
        }

        self.readiness.validate()?;
        self.provider.validate()?;

        Ok(())
    }

    /// Check that local artifacts and source trees exist
    ///
    /// Run before provisioning so a missing file fails the run before any
    /// billable resource exists.
    pub fn check_local_inputs(&self) -> Result<(), ConfigError> {
        for site in &self.sites {
            let path = match &site.deployment {
                DeploymentDescriptor::FileTransfer { artifact_path } => artifact_path,
                DeploymentDescriptor::LocalVersionControl { source_dir, .. } => source_dir,
                DeploymentDescriptor::ExternalRepository { .. } => continue,
            };

            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
        }
        Ok(())
    }
}

// Default value functions
fn default_region() -> String {
    "eastus".to_string()
}

fn default_resource_group_prefix() -> String {
    "rg1NEMV_".to_string()
}

fn default_app_settings() -> Vec<AppSetting> {
    vec![AppSetting::new("PORT", "8080")]
}

fn default_startup_command() -> Option<String> {
    Some(TOMCAT_STARTUP_COMMAND.to_string())
}

fn default_runtime_stack() -> Option<String> {
    Some("TOMCAT|9.0-java11".to_string())
}

fn default_max_wait_secs() -> u64 {
    120
}

fn default_initial_interval_ms() -> u64 {
    1000
}

fn default_max_interval_secs() -> u64 {
    15
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_management_endpoint() -> String {
    "https://management.azure.com".to_string()
}

fn default_authority_host() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_provider_request_timeout_secs() -> u64 {
    60
}

fn default_operation_poll_interval_secs() -> u64 {
    5
}

fn default_operation_max_polls() -> u32 {
    120
}

fn default_plan_sku() -> String {
    "S1".to_string()
}

fn default_plan_tier() -> String {
    "Standard".to_string()
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_wait_secs: default_max_wait_secs(),
            initial_interval_ms: default_initial_interval_ms(),
            max_interval_secs: default_max_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            management_endpoint: default_management_endpoint(),
            authority_host: default_authority_host(),
            request_timeout_secs: default_provider_request_timeout_secs(),
            operation_poll_interval_secs: default_operation_poll_interval_secs(),
            operation_max_polls: default_operation_max_polls(),
            plan_sku: default_plan_sku(),
            plan_tier: default_plan_tier(),
        }
    }
}
