//! In-memory fakes for driving the services without a cloud

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Url;
use tokio_util::sync::CancellationToken;

use crate::domain::{
    HostingPlanId, PublishingCredentials, PublishingFormat, PublishingProfile,
    ResourceGroupHandle, SiteHandle, SiteRequest, SourceControlBinding,
};
use crate::error::{DeployError, ProviderError};
use crate::infrastructure::{
    ArtifactUploader, CloudProvider, ProbeOutcome, ReadinessProbe, RepositoryPusher,
};

/// Shell script standing in for an external tool: it sleeps, then
/// touches `marker`, so a surviving process is observable afterwards
#[cfg(unix)]
pub fn delayed_marker_tool(dir: &Path, name: &str, marker: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(
        &path,
        format!("#!/bin/sh\nsleep 1\ntouch '{}'\n", marker.display()),
    )
    .unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Provider calls in the order they happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    CreateResourceGroup(String),
    DeleteResourceGroup(String),
    CreatePlan(String),
    CreateSite { name: String, plan: Option<String> },
    PublishingProfile { site: String, format: PublishingFormat },
    BindSourceControl { site: String, binding: SourceControlBinding },
}

/// Recording provider with failure injection
#[derive(Default)]
pub struct FakeProvider {
    calls: Mutex<Vec<ProviderCall>>,
    fail_resource_group: bool,
    fail_delete: bool,
    fail_site_number: Option<usize>,
    omit_password: bool,
    mismatched_plan: bool,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_resource_group(mut self) -> Self {
        self.fail_resource_group = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    /// Fail the n-th site creation (1-based)
    pub fn failing_site(mut self, number: usize) -> Self {
        self.fail_site_number = Some(number);
        self
    }

    /// Hand out publishing profiles without a password
    pub fn without_password(mut self) -> Self {
        self.omit_password = true;
        self
    }

    /// Put every site on its own plan, ignoring the one requested
    pub fn with_mismatched_plan(mut self) -> Self {
        self.mismatched_plan = true;
        self
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ProviderCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn count(&self, pred: impl Fn(&ProviderCall) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn deletions(&self) -> usize {
        self.count(|c| matches!(c, ProviderCall::DeleteResourceGroup(_)))
    }

    pub fn plans_created(&self) -> usize {
        self.count(|c| matches!(c, ProviderCall::CreatePlan(_)))
    }

    pub fn sites_created(&self) -> usize {
        self.count(|c| matches!(c, ProviderCall::CreateSite { .. }))
    }

    pub fn bindings(&self) -> Vec<SourceControlBinding> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ProviderCall::BindSourceControl { binding, .. } => Some(binding),
                _ => None,
            })
            .collect()
    }

    fn rejected(operation: &str) -> ProviderError {
        ProviderError::Http {
            operation: operation.to_string(),
            status: 409,
            body: "injected failure".to_string(),
        }
    }
}

#[async_trait]
impl CloudProvider for FakeProvider {
    async fn create_resource_group(
        &self,
        name: &str,
        region: &str,
    ) -> Result<ResourceGroupHandle, ProviderError> {
        self.record(ProviderCall::CreateResourceGroup(name.to_string()));
        if self.fail_resource_group {
            return Err(Self::rejected("create resource group"));
        }
        Ok(ResourceGroupHandle {
            name: name.to_string(),
            region: region.to_string(),
            id: format!("/subscriptions/sub/resourceGroups/{}", name),
        })
    }

    async fn delete_resource_group(
        &self,
        group: &ResourceGroupHandle,
    ) -> Result<(), ProviderError> {
        self.record(ProviderCall::DeleteResourceGroup(group.name.clone()));
        if self.fail_delete {
            return Err(Self::rejected("delete resource group"));
        }
        Ok(())
    }

    async fn create_site(
        &self,
        group: &ResourceGroupHandle,
        request: &SiteRequest<'_>,
    ) -> Result<SiteHandle, ProviderError> {
        self.record(ProviderCall::CreateSite {
            name: request.name.to_string(),
            plan: request.plan.map(|p| p.to_string()),
        });

        if self.fail_site_number == Some(self.sites_created()) {
            return Err(Self::rejected("create site"));
        }

        let plan_id = match (request.plan, self.mismatched_plan) {
            (Some(plan), false) => plan.clone(),
            _ => {
                let plan_name = format!("{}-plan", request.name);
                self.record(ProviderCall::CreatePlan(plan_name.clone()));
                HostingPlanId::new(format!("{}/serverfarms/{}", group.id, plan_name))
            }
        };

        Ok(SiteHandle {
            name: request.name.to_string(),
            id: format!("{}/sites/{}", group.id, request.name),
            default_host_name: format!("{}.sites.test", request.name),
            plan_id,
        })
    }

    async fn publishing_profile(
        &self,
        _group: &ResourceGroupHandle,
        site: &SiteHandle,
        format: PublishingFormat,
    ) -> Result<PublishingProfile, ProviderError> {
        self.record(ProviderCall::PublishingProfile {
            site: site.name.clone(),
            format,
        });

        let publish_url = match format {
            PublishingFormat::Ftp => format!("ftp://{}.ftp.test/site/wwwroot", site.name),
            PublishingFormat::Git => format!("https://{}.scm.test/{}.git", site.name, site.name),
        };

        Ok(PublishingProfile {
            publish_url: Some(publish_url),
            user_name: Some(format!("${}", site.name)),
            password: (!self.omit_password).then(|| format!("pw-{}", site.name)),
        })
    }

    async fn bind_source_control(
        &self,
        _group: &ResourceGroupHandle,
        site: &SiteHandle,
        binding: &SourceControlBinding,
    ) -> Result<(), ProviderError> {
        self.record(ProviderCall::BindSourceControl {
            site: site.name.clone(),
            binding: binding.clone(),
        });
        Ok(())
    }
}

/// Records uploads; optionally fails or cancels the run mid-upload
#[derive(Default)]
pub struct FakeUploader {
    uploads: Mutex<Vec<(PublishingCredentials, PathBuf)>>,
    fail: bool,
    cancel: Option<CancellationToken>,
}

impl FakeUploader {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn cancelling(token: CancellationToken) -> Self {
        Self {
            cancel: Some(token),
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<(PublishingCredentials, PathBuf)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactUploader for FakeUploader {
    async fn upload(
        &self,
        credentials: &PublishingCredentials,
        artifact: &Path,
    ) -> Result<(), DeployError> {
        self.uploads
            .lock()
            .unwrap()
            .push((credentials.clone(), artifact.to_path_buf()));

        if let Some(token) = &self.cancel {
            token.cancel();
        }
        if self.fail {
            return Err(DeployError::transport("530 Login incorrect"));
        }
        Ok(())
    }
}

/// Records pushes; optionally fails them
#[derive(Default)]
pub struct FakePusher {
    pushes: Mutex<Vec<(Url, PathBuf, String)>>,
    fail: bool,
}

impl FakePusher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn pushes(&self) -> Vec<(Url, PathBuf, String)> {
        self.pushes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositoryPusher for FakePusher {
    async fn push(&self, remote: &Url, source_dir: &Path, branch: &str) -> Result<(), DeployError> {
        self.pushes.lock().unwrap().push((
            remote.clone(),
            source_dir.to_path_buf(),
            branch.to_string(),
        ));
        if self.fail {
            return Err(DeployError::transport("remote rejected push"));
        }
        Ok(())
    }
}

/// Scripted readiness probe
pub struct FakeProbe {
    failures_before_ready: Option<u32>,
    never_ready_matching: Option<String>,
    hang: bool,
    attempts: AtomicU32,
    probed: Mutex<Vec<String>>,
}

impl FakeProbe {
    fn with(failures_before_ready: Option<u32>, never_ready_matching: Option<String>) -> Self {
        Self {
            failures_before_ready,
            never_ready_matching,
            hang: false,
            attempts: AtomicU32::new(0),
            probed: Mutex::new(Vec::new()),
        }
    }

    pub fn always_ready() -> Self {
        Self::with(Some(0), None)
    }

    pub fn never_ready() -> Self {
        Self::with(None, None)
    }

    /// Not ready for the first `failures` probes, ready afterwards
    pub fn ready_after(failures: u32) -> Self {
        Self::with(Some(failures), None)
    }

    /// Ready everywhere except URLs containing `fragment`
    pub fn never_ready_for(fragment: &str) -> Self {
        Self::with(Some(0), Some(fragment.to_string()))
    }

    /// Every probe hangs without ever answering
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::never_ready()
        }
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReadinessProbe for FakeProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        self.probed.lock().unwrap().push(url.to_string());
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }

        let blocked = self
            .never_ready_matching
            .as_deref()
            .is_some_and(|fragment| url.contains(fragment));

        match self.failures_before_ready {
            Some(failures) if !blocked && attempt >= failures => ProbeOutcome::Ready { status: 200 },
            _ => ProbeOutcome::NotReady {
                observation: "HTTP 503".to_string(),
            },
        }
    }
}
