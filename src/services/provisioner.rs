//! Resource group and site creation
//!
//! The shared hosting plan is a single-assignment value: the first site
//! creation allocates it, every later site is created against its id.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use crate::config::SitePlan;
use crate::domain::{HostingPlanId, ResourceGroupHandle, SiteHandle, SiteRequest};
use crate::error::ProvisionError;
use crate::infrastructure::CloudProvider;

pub struct Provisioner {
    provider: Arc<dyn CloudProvider>,
    shared_plan: OnceCell<HostingPlanId>,
}

impl Provisioner {
    pub fn new(provider: Arc<dyn CloudProvider>) -> Self {
        Self {
            provider,
            shared_plan: OnceCell::new(),
        }
    }

    pub async fn create_resource_group(
        &self,
        name: &str,
        region: &str,
    ) -> Result<ResourceGroupHandle, ProvisionError> {
        info!(resource_group = %name, region = %region, "Creating resource group");

        let group = self
            .provider
            .create_resource_group(name, region)
            .await
            .map_err(|source| ProvisionError::ResourceGroup {
                name: name.to_string(),
                source,
            })?;

        info!(resource_group = %group.name, "Resource group created");
        Ok(group)
    }

    /// Create one site in `group`, on the shared plan once it exists
    pub async fn create_site(
        &self,
        group: &ResourceGroupHandle,
        name: &str,
        site: &SitePlan,
    ) -> Result<SiteHandle, ProvisionError> {
        let plan = self.shared_plan.get();
        let request = SiteRequest {
            name,
            region: &group.region,
            plan,
            app_settings: &site.app_settings,
            startup_command: site.startup_command.as_deref(),
            runtime_stack: site.runtime_stack.as_deref(),
        };

        match plan {
            Some(plan) => info!(site = %name, plan = %plan, "Creating site on shared plan"),
            None => info!(site = %name, "Creating site with a new hosting plan"),
        }

        let handle = self
            .provider
            .create_site(group, &request)
            .await
            .map_err(|source| ProvisionError::Site {
                name: name.to_string(),
                source,
            })?;

        match plan {
            None => {
                info!(plan = %handle.plan_id, "Hosting plan allocated");
                // Sites are created sequentially, so the cell is still empty here
                let _ = self.shared_plan.set(handle.plan_id.clone());
            }
            Some(expected) if !expected.same_as(&handle.plan_id) => {
                return Err(ProvisionError::PlanMismatch {
                    site: handle.name,
                    expected: expected.to_string(),
                    actual: handle.plan_id.to_string(),
                });
            }
            Some(_) => {}
        }

        info!(site = %handle.name, host = %handle.default_host_name, "Site created");
        Ok(handle)
    }

    /// Plan id allocated by the first site, if any site was created
    pub fn hosting_plan(&self) -> Option<&HostingPlanId> {
        self.shared_plan.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunPlan;
    use crate::services::testing::{FakeProvider, ProviderCall};

    fn group() -> ResourceGroupHandle {
        ResourceGroupHandle {
            name: "rg1NEMV_test".into(),
            region: "eastus".into(),
            id: "/subscriptions/sub/resourceGroups/rg1NEMV_test".into(),
        }
    }

    #[tokio::test]
    async fn test_plan_created_once_and_reused() {
        let provider = Arc::new(FakeProvider::new());
        let provisioner = Provisioner::new(provider.clone());
        let plan = RunPlan::sample();

        let mut sites = Vec::new();
        for (i, site) in plan.sites.iter().enumerate() {
            let name = format!("{}{}", site.name_prefix, i);
            let created = tokio_test::assert_ok!(provisioner.create_site(&group(), &name, site).await);
            sites.push(created);
        }

        assert_eq!(provider.plans_created(), 1);
        let shared = provisioner.hosting_plan().unwrap();
        assert!(sites.iter().all(|s| s.plan_id.same_as(shared)));

        // Only the first request goes out without a plan
        let requested: Vec<Option<String>> = provider
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                ProviderCall::CreateSite { plan, .. } => Some(plan),
                _ => None,
            })
            .collect();
        assert!(requested[0].is_none());
        assert!(requested[1..].iter().all(|p| p.as_deref() == Some(shared.as_str())));
    }

    #[tokio::test]
    async fn test_plan_mismatch_is_an_error() {
        let provider = Arc::new(FakeProvider::new().with_mismatched_plan());
        let provisioner = Provisioner::new(provider);
        let plan = RunPlan::sample();

        provisioner
            .create_site(&group(), "webapp1-a", &plan.sites[0])
            .await
            .unwrap();
        let err = provisioner
            .create_site(&group(), "webapp2-b", &plan.sites[1])
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::PlanMismatch { ref site, .. } if site == "webapp2-b"));
    }

    #[tokio::test]
    async fn test_resource_group_failure_names_group() {
        let provider = Arc::new(FakeProvider::new().failing_resource_group());
        let provisioner = Provisioner::new(provider);

        let err = provisioner
            .create_resource_group("rg1NEMV_x", "eastus")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("rg1NEMV_x"));
    }
}
