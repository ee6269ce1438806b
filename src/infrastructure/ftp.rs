//! FTP artifact upload via curl
//!
//! The artifact lands in `<publishUrl>/webapps/<file name>`, where Tomcat
//! picks it up. Credentials are handed to curl through a config file on
//! stdin so they never appear in the process list.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use super::ArtifactUploader;
use crate::domain::PublishingCredentials;
use crate::error::DeployError;
use crate::tools::{get_tool_path, tools};

/// Directory under the publish root served by Tomcat
const WEBAPPS_DIR: &str = "webapps";

/// Uploads artifacts with `curl -T`
pub struct CurlFtpUploader {
    curl: String,
}

impl Default for CurlFtpUploader {
    fn default() -> Self {
        Self::new()
    }
}

impl CurlFtpUploader {
    pub fn new() -> Self {
        Self {
            curl: get_tool_path(tools::CURL),
        }
    }

    /// Use a specific curl binary
    #[cfg(test)]
    pub fn with_binary(curl: impl Into<String>) -> Self {
        Self { curl: curl.into() }
    }
}

#[async_trait]
impl ArtifactUploader for CurlFtpUploader {
    async fn upload(
        &self,
        credentials: &PublishingCredentials,
        artifact: &Path,
    ) -> Result<(), DeployError> {
        let target = upload_target(credentials.endpoint(), artifact)?;
        info!("Uploading {} to {}", artifact.display(), target);

        let mut child = Command::new(&self.curl)
            .args([
                "--silent",
                "--show-error",
                "--fail",
                "--ftp-create-dirs",
                "--config",
                "-",
                "-T",
            ])
            .arg(artifact)
            .arg(&target)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A cancelled deployment must not leave curl writing into a deleted site
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DeployError::transport(format!("failed to run {}: {}", self.curl, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(curl_config(credentials).as_bytes())
                .await
                .map_err(|e| DeployError::transport(format!("failed to pass credentials to curl: {}", e)))?;
            // Dropping closes stdin so curl stops reading its config
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| DeployError::transport(format!("curl did not finish: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeployError::transport(format!(
                "FTP upload of {} failed ({}): {}",
                artifact.display(),
                output.status,
                stderr.trim()
            )));
        }

        debug!("Upload of {} finished", artifact.display());
        Ok(())
    }
}

/// `ftp://host/site/wwwroot` + `app.war` -> `ftp://host/site/wwwroot/webapps/app.war`
fn upload_target(endpoint: &str, artifact: &Path) -> Result<String, DeployError> {
    let file_name = artifact
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            DeployError::transport(format!("artifact path {} has no file name", artifact.display()))
        })?;

    if !endpoint.starts_with("ftp://") && !endpoint.starts_with("ftps://") {
        return Err(DeployError::malformed("publishUrl"));
    }

    Ok(format!(
        "{}/{}/{}",
        endpoint.trim_end_matches('/'),
        WEBAPPS_DIR,
        file_name
    ))
}

/// curl config carrying the user; quotes and backslashes are escaped
fn curl_config(credentials: &PublishingCredentials) -> String {
    format!(
        "user = \"{}:{}\"\n",
        escape_config_value(credentials.username()),
        escape_config_value(credentials.password())
    )
}

fn escape_config_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
