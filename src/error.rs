//! Centralized error types for appservice-provision
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for a provisioning run
///
/// Each variant maps to a distinct process exit code so callers can tell
/// "bad input" from "cloud refused" from "deployment broke".
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provisioning error: {0}")]
    Provision(#[from] ProvisionError),

    #[error("Deployment to {site} failed: {source}")]
    Deploy {
        site: String,
        #[source]
        source: DeployError,
    },

    #[error("Run cancelled before completion")]
    Cancelled,
}

impl RunError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Provision(_) => 3,
            Self::Deploy { .. } => 4,
            Self::Cancelled => 5,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required configuration missing: {field}")]
    MissingField { field: String },

    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },
}

/// Resource group, hosting plan and site creation errors
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Failed to create resource group {name}: {source}")]
    ResourceGroup {
        name: String,
        #[source]
        source: ProviderError,
    },

    #[error("Failed to create site {name}: {source}")]
    Site {
        name: String,
        #[source]
        source: ProviderError,
    },

    #[error("Site {site} was placed on plan {actual}, expected shared plan {expected}")]
    PlanMismatch {
        site: String,
        expected: String,
        actual: String,
    },

    #[error("Generated name {name} is not usable: {reason}")]
    InvalidName { name: String, reason: String },
}

/// Deployment strategy errors
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Transport failure: {message}")]
    Transport { message: String },

    #[error("Publishing credentials are malformed: {field} is missing or invalid")]
    MalformedCredentials { field: String },

    #[error("Provider call failed: {0}")]
    Provider(#[from] ProviderError),
}

impl DeployError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn malformed(field: impl Into<String>) -> Self {
        Self::MalformedCredentials {
            field: field.into(),
        }
    }
}

/// Errors reported by a cloud provider adapter
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("{operation} returned HTTP {status}: {body}")]
    Http {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("{operation} request failed: {message}")]
    Request { operation: String, message: String },

    #[error("{operation} finished with status {status}")]
    OperationFailed { operation: String, status: String },

    #[error("{operation} did not complete after {polls} status polls")]
    OperationTimeout { operation: String, polls: u32 },

    #[error("Unexpected response from {operation}: {message}")]
    Malformed { operation: String, message: String },
}

/// Resource group deletion failure (logged, never escalated)
#[derive(Error, Debug)]
#[error("Failed to delete resource group {name}: {source}")]
pub struct TeardownError {
    pub name: String,
    #[source]
    pub source: ProviderError,
}

/// A site did not answer before the readiness deadline (warning only)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{url} not ready after {} ({attempts} attempts, last: {last_observation})", humantime::format_duration(*.waited))]
pub struct ReadinessTimeout {
    pub url: String,
    pub waited: Duration,
    pub attempts: u32,
    pub last_observation: String,
}
