//! Resource group, hosting plan and site types

use std::fmt;

use serde::{Deserialize, Serialize};

/// A created resource group. Owns every other resource of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGroupHandle {
    /// Generated resource group name
    pub name: String,
    /// Region the group is scoped to
    pub region: String,
    /// Provider identifier (ARM resource id for Azure)
    pub id: String,
}

/// Identifier of the shared hosting plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostingPlanId(String);

impl HostingPlanId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Provider ids are case-insensitive (`resourceGroups` vs `resourcegroups`)
    pub fn same_as(&self, other: &HostingPlanId) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for HostingPlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Application setting (name/value pair) applied to a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSetting {
    pub name: String,
    pub value: String,
}

impl AppSetting {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Everything the provider needs to create one site
#[derive(Debug, Clone)]
pub struct SiteRequest<'a> {
    pub name: &'a str,
    pub region: &'a str,
    /// Shared plan; `None` asks the provider to allocate a new one
    pub plan: Option<&'a HostingPlanId>,
    pub app_settings: &'a [AppSetting],
    pub startup_command: Option<&'a str>,
    /// Runtime stack, e.g. `TOMCAT|9.0-java11`
    pub runtime_stack: Option<&'a str>,
}

/// A fully provisioned site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteHandle {
    pub name: String,
    pub id: String,
    /// Public host name, e.g. `webapp1-1a2b.azurewebsites.net`
    pub default_host_name: String,
    /// Plan the site runs on
    pub plan_id: HostingPlanId,
}

impl SiteHandle {
    /// Public URL of the site, optionally with a path such as `/helloworld`
    pub fn public_url(&self, path: Option<&str>) -> String {
        let base = format!("http://{}", self.default_host_name.trim_end_matches('/'));
        match path.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) if p.starts_with('/') => format!("{}{}", base, p),
            Some(p) => format!("{}/{}", base, p),
            None => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> SiteHandle {
        SiteHandle {
            name: "webapp1-abc".into(),
            id: "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Web/sites/webapp1-abc"
                .into(),
            default_host_name: "webapp1-abc.azurewebsites.net".into(),
            plan_id: HostingPlanId::new("plan"),
        }
    }

    #[test]
    fn test_public_url_without_path() {
        assert_eq!(handle().public_url(None), "http://webapp1-abc.azurewebsites.net");
    }

    #[test]
    fn test_public_url_with_path() {
        let site = handle();
        assert_eq!(
            site.public_url(Some("/helloworld")),
            "http://webapp1-abc.azurewebsites.net/helloworld"
        );
        assert_eq!(
            site.public_url(Some("helloworld")),
            "http://webapp1-abc.azurewebsites.net/helloworld"
        );
        assert_eq!(site.public_url(Some("  ")), "http://webapp1-abc.azurewebsites.net");
    }

    #[test]
    fn test_plan_id_comparison_ignores_case() {
        let a = HostingPlanId::new("/subscriptions/s/resourceGroups/RG/providers/Microsoft.Web/serverfarms/p");
        let b = HostingPlanId::new("/subscriptions/s/resourcegroups/rg/providers/Microsoft.Web/serverFarms/p");
        assert!(a.same_as(&b));
        assert!(!a.same_as(&HostingPlanId::new("other")));
    }
}
