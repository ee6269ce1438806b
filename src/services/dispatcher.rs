//! Deployment strategy dispatch
//!
//! Routes each site's descriptor to exactly one handler, then verifies the
//! result by polling the site's public URL. Publishing credentials are
//! fetched per site and dropped once the handler returns.

use std::path::Path;
use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::readiness::ReadinessChecker;
use crate::domain::{
    DeployReport, DeploymentDescriptor, PublishingCredentials, PublishingFormat,
    ResourceGroupHandle, SiteHandle, SourceControlBinding,
};
use crate::error::DeployError;
use crate::infrastructure::git::authenticated_remote;
use crate::infrastructure::{ArtifactUploader, CloudProvider, RepositoryPusher};

pub struct DeploymentDispatcher {
    provider: Arc<dyn CloudProvider>,
    uploader: Arc<dyn ArtifactUploader>,
    pusher: Arc<dyn RepositoryPusher>,
    readiness: ReadinessChecker,
}

impl DeploymentDispatcher {
    pub fn new(
        provider: Arc<dyn CloudProvider>,
        uploader: Arc<dyn ArtifactUploader>,
        pusher: Arc<dyn RepositoryPusher>,
        readiness: ReadinessChecker,
    ) -> Self {
        Self {
            provider,
            uploader,
            pusher,
            readiness,
        }
    }

    /// Deploy `descriptor` to `site` and wait for the site to answer
    ///
    /// A readiness timeout is recorded in the report, not returned as an error.
    pub async fn deploy(
        &self,
        group: &ResourceGroupHandle,
        site: &SiteHandle,
        descriptor: &DeploymentDescriptor,
        warmup_path: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<DeployReport, DeployError> {
        let started = Instant::now();
        let strategy = descriptor.kind();
        info!(site = %site.name, strategy = %strategy, "Deploying");

        match descriptor {
            DeploymentDescriptor::FileTransfer { artifact_path } => {
                self.upload_artifact(group, site, artifact_path).await?
            }
            DeploymentDescriptor::LocalVersionControl { source_dir, branch } => {
                self.push_source(group, site, source_dir, branch).await?
            }
            DeploymentDescriptor::ExternalRepository {
                url,
                branch,
                continuous_integration,
            } => {
                let binding = SourceControlBinding {
                    repo_url: url.clone(),
                    branch: branch.clone(),
                    continuous_integration: *continuous_integration,
                };
                self.provider
                    .bind_source_control(group, site, &binding)
                    .await?
            }
        }

        let url = site.public_url(warmup_path);
        let readiness = self.readiness.wait_until_ready(&url, cancel).await;

        Ok(DeployReport {
            site: site.name.clone(),
            url,
            strategy,
            readiness,
            duration: started.elapsed(),
        })
    }

    async fn credentials(
        &self,
        group: &ResourceGroupHandle,
        site: &SiteHandle,
        format: PublishingFormat,
    ) -> Result<PublishingCredentials, DeployError> {
        let profile = self.provider.publishing_profile(group, site, format).await?;
        PublishingCredentials::from_profile(profile)
    }

    async fn upload_artifact(
        &self,
        group: &ResourceGroupHandle,
        site: &SiteHandle,
        artifact: &Path,
    ) -> Result<(), DeployError> {
        let credentials = self.credentials(group, site, PublishingFormat::Ftp).await?;
        self.uploader.upload(&credentials, artifact).await
    }

    async fn push_source(
        &self,
        group: &ResourceGroupHandle,
        site: &SiteHandle,
        source_dir: &Path,
        branch: &str,
    ) -> Result<(), DeployError> {
        let credentials = self.credentials(group, site, PublishingFormat::Git).await?;
        let remote = authenticated_remote(&credentials)?;
        self.pusher.push(&remote, source_dir, branch).await
    }
}
