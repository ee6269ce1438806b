//! Git push to a site's deployment remote
//!
//! The remote URL carries the site's publishing user and password, so it
//! is built here, passed straight to `git`, and scrubbed from anything
//! that gets reported back.
//!
//! A source directory that is not a git work tree of its own is committed
//! into a scratch repository first and that commit is pushed.

use std::ffi::{OsStr, OsString};
use std::path::Path;

use async_trait::async_trait;
use reqwest::Url;
use tokio::process::Command;
use tracing::{debug, info};

use super::RepositoryPusher;
use crate::domain::PublishingCredentials;
use crate::error::DeployError;
use crate::tools::{get_tool_path, tools};

const REDACTED: &str = "<redacted>";

/// Pushes local work trees with the `git` binary
pub struct GitPusher {
    git: String,
}

impl Default for GitPusher {
    fn default() -> Self {
        Self::new()
    }
}

impl GitPusher {
    pub fn new() -> Self {
        Self {
            git: get_tool_path(tools::GIT),
        }
    }

    /// Use a specific git binary
    #[cfg(test)]
    pub fn with_binary(git: impl Into<String>) -> Self {
        Self { git: git.into() }
    }
}

impl GitPusher {
    /// Run one git command, failing with redacted stderr
    async fn git(&self, args: &[&OsStr], dir: &Path, remote: &Url) -> Result<(), DeployError> {
        let output = Command::new(&self.git)
            .args(["-c", "user.name=appservice-provision"])
            .args(["-c", "user.email=appservice-provision@localhost"])
            .args(["-c", "commit.gpgsign=false"])
            .args(args)
            .current_dir(dir)
            // Fail instead of prompting when the credentials are rejected
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DeployError::transport(format!("failed to run {}: {}", self.git, e)))?;

        if !output.status.success() {
            let verb = args
                .iter()
                .map(|a| a.to_string_lossy())
                .find(|a| !a.starts_with("--"))
                .unwrap_or_default();
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeployError::transport(format!(
                "git {} in {} failed ({}): {}",
                verb,
                dir.display(),
                output.status,
                redact(stderr.trim(), remote)
            )));
        }
        Ok(())
    }

    /// Commit the contents of `source_dir` into a throwaway repository
    /// and push that commit; `source_dir` itself is left untouched
    async fn push_snapshot(&self, remote: &Url, source_dir: &Path, branch: &str) -> Result<(), DeployError> {
        let scratch = tempfile::tempdir()
            .map_err(|e| DeployError::transport(format!("failed to create scratch repository: {}", e)))?;
        let git_dir = scratch.path().join(".git");

        let mut git_dir_arg = OsString::from("--git-dir=");
        git_dir_arg.push(&git_dir);
        let mut work_tree_arg = OsString::from("--work-tree=");
        work_tree_arg.push(source_dir);
        let scoped = |rest: &[&'static str]| {
            let mut args: Vec<OsString> = vec![git_dir_arg.clone(), work_tree_arg.clone()];
            args.extend(rest.iter().map(|a| OsString::from(*a)));
            args
        };

        debug!("Snapshotting {} into {}", source_dir.display(), git_dir.display());
        self.git(
            &[OsStr::new("init"), OsStr::new("--quiet"), scratch.path().as_os_str()],
            source_dir,
            remote,
        )
        .await?;

        for step in [
            scoped(&["add", "--all"]),
            scoped(&["commit", "--quiet", "--allow-empty", "-m", "Deploy snapshot"]),
        ] {
            let args: Vec<&OsStr> = step.iter().map(OsString::as_os_str).collect();
            self.git(&args, source_dir, remote).await?;
        }

        let target = format!("HEAD:{}", branch);
        let mut push = scoped(&["push"]);
        push.push(OsString::from(remote.as_str()));
        push.push(OsString::from(target));
        let args: Vec<&OsStr> = push.iter().map(OsString::as_os_str).collect();
        self.git(&args, source_dir, remote).await
    }
}

#[async_trait]
impl RepositoryPusher for GitPusher {
    async fn push(&self, remote: &Url, source_dir: &Path, branch: &str) -> Result<(), DeployError> {
        info!(
            "Pushing {} to {} (branch {})",
            source_dir.display(),
            display_remote(remote),
            branch
        );

        if source_dir.join(".git").exists() {
            let target = format!("HEAD:{}", branch);
            self.git(
                &[OsStr::new("push"), OsStr::new(remote.as_str()), OsStr::new(&target)],
                source_dir,
                remote,
            )
            .await?;
        } else {
            self.push_snapshot(remote, source_dir, branch).await?;
        }

        debug!("git push from {} finished", source_dir.display());
        Ok(())
    }
}

/// Remote URL with the site's publishing user and password embedded
pub fn authenticated_remote(credentials: &PublishingCredentials) -> Result<Url, DeployError> {
    let mut url =
        Url::parse(credentials.endpoint()).map_err(|_| DeployError::malformed("publishUrl"))?;

    if !matches!(url.scheme(), "https" | "http") || url.host_str().is_none() {
        return Err(DeployError::malformed("publishUrl"));
    }

    url.set_username(credentials.username())
        .map_err(|_| DeployError::malformed("userName"))?;
    url.set_password(Some(credentials.password()))
        .map_err(|_| DeployError::malformed("userPWD"))?;

    Ok(url)
}

/// Remote without its userinfo, safe to log
fn display_remote(remote: &Url) -> String {
    let mut shown = remote.clone();
    let _ = shown.set_username("");
    let _ = shown.set_password(None);
    shown.to_string()
}

/// Strip the embedded password from git's output
fn redact(text: &str, remote: &Url) -> String {
    let mut cleaned = text.replace(remote.as_str(), &display_remote(remote));
    if let Some(password) = remote.password().filter(|p| !p.is_empty()) {
        cleaned = cleaned.replace(password, REDACTED);
    }
    cleaned
}
