//! Runtime tool path resolution
//!
//! File transfer and git pushes shell out to `curl` and `git`. For each
//! tool we:
//! 1. Check for an environment variable `{TOOL}_BIN` (e.g., `CURL_BIN`)
//! 2. Fall back to PATH-based invocation if the envvar is not set
//!
//! Nix wrappers export explicit store paths this way; tests override the
//! variable to point at a stub.

use std::env;

use anyhow::Result;

/// Tools invoked by the deployment adapters
pub mod tools {
    pub const CURL: &str = "curl";
    pub const GIT: &str = "git";
}

/// Get the path to an external tool
///
/// Reads `{TOOL}_BIN` (uppercased, `-` mapped to `_`) and falls back to
/// the bare tool name.
///
/// ```rust,ignore
/// // With CURL_BIN="/nix/store/abc-curl-8.9.1/bin/curl"
/// assert_eq!(get_tool_path("curl"), "/nix/store/abc-curl-8.9.1/bin/curl");
/// ```
pub fn get_tool_path(tool: &str) -> String {
    let env_var = format!("{}_BIN", tool.to_uppercase().replace('-', "_"));
    env::var(&env_var).unwrap_or_else(|_| tool.to_string())
}

/// Resolve a tool and make sure it can actually be executed
///
/// Used before provisioning so a missing `git` is reported as a
/// configuration problem instead of failing after sites exist.
pub fn require_tool(tool: &str) -> Result<String> {
    let path = get_tool_path(tool);
    which::which(&path)
        .map(|_| path.clone())
        .map_err(|_| anyhow::anyhow!("required tool '{}' not found (looked for '{}')", tool, path))
}
