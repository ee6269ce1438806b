//! # Run Configuration
//!
//! Two inputs drive a run:
//!
//! 1. **Provider credentials** (`CLIENT_ID`, `CLIENT_SECRET`, `TENANT_ID`,
//!    `SUBSCRIPTION_ID`), taken from flags or the environment. All four are
//!    required before anything is provisioned.
//!
//! 2. **Run plan** (`--plan plan.yaml`), the region, naming prefixes,
//!    readiness policy and the ordered list of sites with their deployment
//!    strategies. Without a file the built-in sample plan is used. Its
//!    local inputs ship with the crate and are resolved against the working
//!    directory: `assets/helloworld.war` for the FTP upload and the
//!    `azure-samples-appservice-helloworld/` tree for the git push (a plain
//!    directory is committed into a scratch repository before pushing).
//!
//! ## Example Plan
//!
//! ```yaml
//! region: eastus
//! readiness:
//!   max_wait_secs: 180
//! sites:
//!   - name_prefix: webapp1-
//!     warmup_path: /helloworld
//!     deployment:
//!       strategy: file-transfer
//!       artifact_path: assets/helloworld.war
//!   - name_prefix: webapp4-
//!     deployment:
//!       strategy: external-repository
//!       url: https://github.com/Azure-Samples/app-service-web-java-get-started
//!       continuous_integration: true
//! ```

mod plan;

use std::fmt;

use crate::error::ConfigError;
use crate::validation::validate_secret;

pub use plan::{ProviderSettings, ReadinessConfig, RunPlan, SitePlan};

/// Service principal used against the resource management API
#[derive(Clone)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub subscription_id: String,
}

impl ProviderCredentials {
    /// Build credentials, reporting the first missing input by its variable name
    pub fn from_parts(
        client_id: Option<String>,
        client_secret: Option<String>,
        tenant_id: Option<String>,
        subscription_id: Option<String>,
    ) -> Result<Self, ConfigError> {
        fn required(value: Option<String>, field: &str) -> Result<String, ConfigError> {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingField {
                    field: field.to_string(),
                })
        }

        let credentials = Self {
            client_id: required(client_id, "CLIENT_ID")?,
            client_secret: required(client_secret, "CLIENT_SECRET")?,
            tenant_id: required(tenant_id, "TENANT_ID")?,
            subscription_id: required(subscription_id, "SUBSCRIPTION_ID")?,
        };

        validate_secret(&credentials.client_secret, "CLIENT_SECRET").map_err(|e| {
            ConfigError::InvalidValue {
                field: "CLIENT_SECRET".to_string(),
                value: e.to_string(),
            }
        })?;

        Ok(credentials)
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}
