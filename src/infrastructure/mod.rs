//! Infrastructure layer - external I/O adapters
//!
//! This module contains all code that interacts with external systems:
//! - Resource management API (Azure Resource Manager)
//! - FTP uploads (via curl)
//! - Git pushes (via git)
//! - HTTP readiness probes
//!
//! Each concern sits behind a trait so the services layer can be driven by
//! in-memory fakes in tests.

pub mod arm;
pub mod ftp;
pub mod git;
pub mod http_probe;
pub mod publish_profile;

use std::path::Path;

use async_trait::async_trait;
use reqwest::Url;

use crate::domain::{
    PublishingCredentials, PublishingFormat, PublishingProfile, ResourceGroupHandle, SiteHandle,
    SiteRequest, SourceControlBinding,
};
use crate::error::{DeployError, ProviderError};

// Re-export commonly used types
pub use arm::ArmProvider;
pub use ftp::CurlFtpUploader;
pub use git::GitPusher;
pub use http_probe::HttpReadinessProbe;

/// Resource management operations
///
/// Every call returns only once the provider reports the resource fully
/// provisioned (or deleted); adapters poll long-running operations to
/// completion themselves.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    async fn create_resource_group(
        &self,
        name: &str,
        region: &str,
    ) -> Result<ResourceGroupHandle, ProviderError>;

    async fn delete_resource_group(&self, group: &ResourceGroupHandle)
        -> Result<(), ProviderError>;

    /// Create a site; allocates a new hosting plan when `request.plan` is `None`
    async fn create_site(
        &self,
        group: &ResourceGroupHandle,
        request: &SiteRequest<'_>,
    ) -> Result<SiteHandle, ProviderError>;

    /// Fetch fresh publishing metadata for one site
    async fn publishing_profile(
        &self,
        group: &ResourceGroupHandle,
        site: &SiteHandle,
        format: PublishingFormat,
    ) -> Result<PublishingProfile, ProviderError>;

    async fn bind_source_control(
        &self,
        group: &ResourceGroupHandle,
        site: &SiteHandle,
        binding: &SourceControlBinding,
    ) -> Result<(), ProviderError>;
}

/// Uploads a packaged artifact to a site's file-transfer endpoint
#[async_trait]
pub trait ArtifactUploader: Send + Sync {
    async fn upload(
        &self,
        credentials: &PublishingCredentials,
        artifact: &Path,
    ) -> Result<(), DeployError>;
}

/// Pushes a local work tree to an authenticated git remote
#[async_trait]
pub trait RepositoryPusher: Send + Sync {
    /// `remote` embeds credentials and must never be logged
    async fn push(&self, remote: &Url, source_dir: &Path, branch: &str)
        -> Result<(), DeployError>;
}

/// Single readiness probe result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Ready { status: u16 },
    NotReady { observation: String },
}

/// One HTTP request against a site's public URL
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}
