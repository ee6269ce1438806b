//! Deployment descriptors and publishing credentials
//!
//! A site gets exactly one descriptor, chosen when the run plan is built.
//! Credentials are never part of a descriptor: they are fetched from the
//! provider for each site at deploy time.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::DeployError;

fn default_branch() -> String {
    "master".to_string()
}

/// How a site receives its code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum DeploymentDescriptor {
    /// Upload a packaged artifact over FTP
    FileTransfer { artifact_path: PathBuf },

    /// Push a local git work tree to the site's git remote
    LocalVersionControl {
        source_dir: PathBuf,
        #[serde(default = "default_branch")]
        branch: String,
    },

    /// Bind a public repository as the site's source control
    ExternalRepository {
        url: String,
        #[serde(default = "default_branch")]
        branch: String,
        #[serde(default)]
        continuous_integration: bool,
    },
}

impl DeploymentDescriptor {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::FileTransfer { .. } => StrategyKind::FileTransfer,
            Self::LocalVersionControl { .. } => StrategyKind::LocalVersionControl,
            Self::ExternalRepository {
                continuous_integration: false,
                ..
            } => StrategyKind::ExternalRepository,
            Self::ExternalRepository {
                continuous_integration: true,
                ..
            } => StrategyKind::ContinuousIntegration,
        }
    }
}

/// Flat strategy tag used for logging and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    FileTransfer,
    LocalVersionControl,
    ExternalRepository,
    ContinuousIntegration,
}

impl StrategyKind {
    /// Get human-readable name for the strategy
    pub fn name(&self) -> &'static str {
        match self {
            Self::FileTransfer => "FTP upload",
            Self::LocalVersionControl => "local Git push",
            Self::ExternalRepository => "public repository",
            Self::ContinuousIntegration => "repository with continuous integration",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which publishing endpoint the credentials are for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishingFormat {
    Ftp,
    Git,
}

/// Raw publishing metadata as returned by the provider
///
/// Any field may be absent; [`PublishingCredentials::from_profile`] decides
/// whether the profile is usable.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PublishingProfile {
    pub publish_url: Option<String>,
    pub user_name: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for PublishingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishingProfile")
            .field("publish_url", &self.publish_url)
            .field("user_name", &self.user_name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Validated endpoint, user and password for one site
#[derive(Clone, PartialEq, Eq)]
pub struct PublishingCredentials {
    endpoint: String,
    username: String,
    password: String,
}

impl PublishingCredentials {
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Require endpoint, user name and password to be present and non-blank
    pub fn from_profile(profile: PublishingProfile) -> Result<Self, DeployError> {
        fn required(value: Option<String>, field: &str) -> Result<String, DeployError> {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| DeployError::malformed(field))
        }

        Ok(Self {
            endpoint: required(profile.publish_url, "publishUrl")?,
            username: required(profile.user_name, "userName")?,
            password: required(profile.password, "userPWD")?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for PublishingCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishingCredentials")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source control binding sent to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceControlBinding {
    pub repo_url: String,
    pub branch: String,
    /// Redeploy automatically on every push to `branch`
    pub continuous_integration: bool,
}
