//! Validation utilities for resource names and run configuration
//!
//! Site names end up as public DNS labels (`<name>.azurewebsites.net`) and
//! resource group names end up in ARM URLs, so both are checked locally
//! before any request is made.

use anyhow::Result;

/// Maximum length of a site name (DNS label limit imposed by App Service)
pub const SITE_NAME_MAX_LENGTH: usize = 60;

/// Maximum length of a resource group name
pub const RESOURCE_GROUP_NAME_MAX_LENGTH: usize = 90;

/// Characters allowed in resource group names besides alphanumerics
const RESOURCE_GROUP_ALLOWED_CHARS: &[char] = &['_', '-', '.', '(', ')'];

/// Validate a site name
///
/// Site names must:
/// - Be 2 to 60 characters long
/// - Contain only ASCII alphanumerics and hyphens
/// - Not start or end with a hyphen
pub fn validate_site_name(name: &str) -> Result<()> {
    if name.len() < 2 {
        anyhow::bail!("site name must be at least 2 characters, got: '{}'", name);
    }

    if name.len() > SITE_NAME_MAX_LENGTH {
        anyhow::bail!(
            "site name exceeds maximum length ({} > {})",
            name.len(),
            SITE_NAME_MAX_LENGTH
        );
    }

    if name.starts_with('-') || name.ends_with('-') {
        anyhow::bail!("site name cannot start or end with a hyphen: '{}'", name);
    }

    let invalid_chars: Vec<char> = name
        .chars()
        .filter(|c| !c.is_ascii_alphanumeric() && *c != '-')
        .collect();

    if !invalid_chars.is_empty() {
        anyhow::bail!(
            "site name contains invalid characters: {:?} (allowed: a-z, A-Z, 0-9, -)",
            invalid_chars
        );
    }

    Ok(())
}

/// Validate a resource group name
///
/// Resource group names must:
/// - Not be empty
/// - Not exceed 90 characters
/// - Contain only alphanumerics, underscore, hyphen, period or parentheses
/// - Not end with a period
pub fn validate_resource_group_name(name: &str) -> Result<()> {
    if name.is_empty() {
        anyhow::bail!("resource group name cannot be empty");
    }

    if name.len() > RESOURCE_GROUP_NAME_MAX_LENGTH {
        anyhow::bail!(
            "resource group name exceeds maximum length ({} > {})",
            name.len(),
            RESOURCE_GROUP_NAME_MAX_LENGTH
        );
    }

    if name.ends_with('.') {
        anyhow::bail!("resource group name cannot end with a period: '{}'", name);
    }

    let invalid_chars: Vec<char> = name
        .chars()
        .filter(|c| !c.is_ascii_alphanumeric() && !RESOURCE_GROUP_ALLOWED_CHARS.contains(c))
        .collect();

    if !invalid_chars.is_empty() {
        anyhow::bail!(
            "resource group name contains invalid characters: {:?} (allowed: a-z, A-Z, 0-9, _, -, ., (, ))",
            invalid_chars
        );
    }

    Ok(())
}

/// Validate that a secret is not empty and has no stray whitespace
///
/// The value itself is never included in the error.
pub fn validate_secret(secret: &str, field_name: &str) -> Result<()> {
    if secret.is_empty() {
        anyhow::bail!("{} cannot be empty", field_name);
    }

    if secret != secret.trim() {
        anyhow::bail!(
            "{} contains leading or trailing whitespace (this is likely unintentional)",
            field_name
        );
    }

    Ok(())
}

/// Validate that a repository URL is an absolute http(s) URL
pub fn validate_repository_url(url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| anyhow::anyhow!("invalid repository URL '{}': {}", url, e))?;

    if !matches!(parsed.scheme(), "https" | "http") {
        anyhow::bail!(
            "repository URL must use http or https, got: {}",
            parsed.scheme()
        );
    }

    if parsed.host_str().is_none() {
        anyhow::bail!("repository URL has no host: '{}'", url);
    }

    Ok(())
}

/// Validate configuration numeric values are within reasonable bounds
pub fn validate_numeric_range(value: u64, field_name: &str, min: u64, max: u64) -> Result<()> {
    if value < min || value > max {
        anyhow::bail!(
            "{} must be between {} and {}, got: {}",
            field_name,
            min,
            max,
            value
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_site_name_valid() {
        assert!(validate_site_name("webapp1-3f9a0c1d").is_ok());
        assert!(validate_site_name("ab").is_ok());
        assert!(validate_site_name(&"a".repeat(60)).is_ok());
    }

    #[test]
    fn test_validate_site_name_invalid() {
        // Too short
        assert!(validate_site_name("a").is_err());

        // Hyphen at the edges
        assert!(validate_site_name("-webapp").is_err());
        assert!(validate_site_name("webapp-").is_err());

        // Contains invalid chars
        assert!(validate_site_name("web_app").is_err());
        assert!(validate_site_name("web.app").is_err());
        assert!(validate_site_name("web app").is_err());

        // Too long
        assert!(validate_site_name(&"a".repeat(61)).is_err());
    }

    #[test]
    fn test_validate_resource_group_name() {
        assert!(validate_resource_group_name("rg1NEMV_3f9a0c1d").is_ok());
        assert!(validate_resource_group_name("my-rg.(prod)").is_ok());

        assert!(validate_resource_group_name("").is_err());
        assert!(validate_resource_group_name("ends.with.period.").is_err());
        assert!(validate_resource_group_name("has/slash").is_err());
        assert!(validate_resource_group_name(&"r".repeat(91)).is_err());
    }

    #[test]
    fn test_validate_secret() {
        assert!(validate_secret("s3cr3t", "CLIENT_SECRET").is_ok());

        assert!(validate_secret("", "CLIENT_SECRET").is_err());
        let err = validate_secret(" s3cr3t ", "CLIENT_SECRET").unwrap_err();
        assert!(!err.to_string().contains("s3cr3t"));
    }

    #[test]
    fn test_validate_repository_url() {
        assert!(validate_repository_url("https://github.com/azure-appservice-samples/java-get-started").is_ok());

        assert!(validate_repository_url("github.com/org/repo").is_err());
        assert!(validate_repository_url("ftp://example.com/repo").is_err());
    }

    #[test]
    fn test_validate_numeric_range() {
        // Valid values
        assert!(validate_numeric_range(5, "max_wait_secs", 1, 10).is_ok());
        assert!(validate_numeric_range(1, "max_wait_secs", 1, 10).is_ok());
        assert!(validate_numeric_range(10, "max_wait_secs", 1, 10).is_ok());

        // Invalid values
        assert!(validate_numeric_range(0, "max_wait_secs", 1, 10).is_err());
        assert!(validate_numeric_range(11, "max_wait_secs", 1, 10).is_err());
    }
}
