//! Random resource names
//!
//! Site names become public host names, so they must be unique before the
//! provider ever sees them. The generator remembers every name it handed
//! out during the run and never repeats one.

use std::collections::HashSet;

use uuid::Uuid;

use crate::error::ProvisionError;
use crate::validation::{validate_resource_group_name, validate_site_name};

/// Random characters appended to every prefix
const SUFFIX_LEN: usize = 8;

/// Regeneration attempts before giving up on a unique name
const MAX_ATTEMPTS: usize = 16;

type SuffixSource = Box<dyn FnMut() -> String + Send>;

pub struct NameGenerator {
    issued: HashSet<String>,
    suffix: SuffixSource,
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::with_suffix_source(Box::new(|| {
            Uuid::new_v4().simple().to_string()[..SUFFIX_LEN].to_string()
        }))
    }

    pub fn with_suffix_source(suffix: SuffixSource) -> Self {
        Self {
            issued: HashSet::new(),
            suffix,
        }
    }

    /// Generate a unique site name such as `webapp1-3f9a0c1d`
    pub fn site_name(&mut self, prefix: &str) -> Result<String, ProvisionError> {
        self.generate(prefix, |name| validate_site_name(name))
    }

    /// Generate a unique resource group name such as `rg1NEMV_3f9a0c1d`
    pub fn resource_group_name(&mut self, prefix: &str) -> Result<String, ProvisionError> {
        self.generate(prefix, |name| validate_resource_group_name(name))
    }

    fn generate<V>(&mut self, prefix: &str, validate: V) -> Result<String, ProvisionError>
    where
        V: Fn(&str) -> anyhow::Result<()>,
    {
        for _ in 0..MAX_ATTEMPTS {
            let name = format!("{}{}", prefix, (self.suffix)());
            validate(&name).map_err(|e| ProvisionError::InvalidName {
                name: name.clone(),
                reason: e.to_string(),
            })?;

            // Case-insensitive: host names and resource group names both are
            if self.issued.insert(name.to_lowercase()) {
                return Ok(name);
            }
        }

        Err(ProvisionError::InvalidName {
            name: prefix.to_string(),
            reason: format!("no unique name after {} attempts", MAX_ATTEMPTS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_name_uses_prefix() {
        let mut names = NameGenerator::new();
        let name = names.site_name("webapp1-").unwrap();
        assert!(name.starts_with("webapp1-"));
        assert_eq!(name.len(), "webapp1-".len() + SUFFIX_LEN);
    }

    #[test]
    fn test_names_are_unique_within_a_run() {
        let mut names = NameGenerator::new();
        let generated: HashSet<String> = (0..50)
            .map(|_| names.site_name("webapp-").unwrap())
            .collect();
        assert_eq!(generated.len(), 50);
    }

    #[test]
    fn test_collision_is_regenerated() {
        let mut values = vec!["bbbb", "aaaa", "aaaa"].into_iter().map(String::from);
        let mut names =
            NameGenerator::with_suffix_source(Box::new(move || values.next_back().unwrap()));

        assert_eq!(names.site_name("app-").unwrap(), "app-aaaa");
        assert_eq!(names.site_name("app-").unwrap(), "app-bbbb");
    }

    #[test]
    fn test_exhausted_uniqueness_is_an_error() {
        let mut names = NameGenerator::with_suffix_source(Box::new(|| "same".to_string()));
        names.site_name("app-").unwrap();
        let err = names.site_name("app-").unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidName { .. }));
    }

    #[test]
    fn test_invalid_prefix_is_rejected() {
        let mut names = NameGenerator::new();
        let err = names.site_name("web_app!").unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidName { .. }));
    }

    #[test]
    fn test_resource_group_prefix_allows_underscore() {
        let mut names = NameGenerator::new();
        let name = names.resource_group_name("rg1NEMV_").unwrap();
        assert!(name.starts_with("rg1NEMV_"));
    }
}
