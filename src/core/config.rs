//! Configuration structures and types for central-publisher
//!
//! This module provides type-safe configuration management with serde support.
//! [`PublishConfig`] mirrors the layered YAML/env/CLI sources where every field
//! is optional; [`PublishConfig::resolve`] turns it into runtime [`Settings`].

use crate::bundle::ChecksumAlgorithm;
use crate::core::coordinates::Coordinates;
use crate::core::error::DeployError;
use crate::core::traits::PublishingType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default Central Portal location
pub const DEFAULT_PORTAL_BASE_URI: &str = "https://central.sonatype.com";

/// Default Maven Central repository used to await artifacts
pub const DEFAULT_MAVEN_CENTRAL_BASE_URI: &str = "https://repo.maven.apache.org/maven2/";

const DEFAULT_TIMEOUT_SECONDS: u64 = 30 * 60;
const DEFAULT_SLEEP_BETWEEN_RETRIES_SECONDS: u64 = 5;
const DEFAULT_STATUS_POLL_INTERVAL_SECONDS: u64 = 5;

/// Root configuration object
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PublishConfig {
    /// Directory holding the staged artifacts (required after merging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// Central Portal base uri
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portal_base_uri: Option<String>,

    /// Maven repository probed when awaiting an artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maven_central_base_uri: Option<String>,

    /// Where the bundle archive is written and kept (default: system temp
    /// dir, removed after upload)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_directory: Option<PathBuf>,

    /// Checksum files created for every artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksums: Option<Vec<ChecksumAlgorithm>>,

    /// Deployment behaviour
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentConfig>,
}

/// Deployment behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeploymentConfig {
    /// Deployment name shown on the portal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// AUTOMATIC or USER_MANAGED (default: AUTOMATIC)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publishing_type: Option<PublishingType>,

    /// Drop failed deployments (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_on_failure: Option<bool>,

    /// Treat a failure made only of "already exists" errors as success (default: false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_already_exists_error: Option<bool>,

    /// `group:artifact:version` to await on Maven Central after publishing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub await_artifact: Option<String>,

    /// Upper bound for awaiting the artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// Pause between artifact probes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_between_retries_seconds: Option<u64>,

    /// Pause between deployment status queries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_poll_interval_seconds: Option<u64>,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub directory: PathBuf,
    pub portal_base_uri: String,
    pub maven_central_base_uri: String,
    /// Kept bundles go here, `None` means a temporary bundle
    pub bundle_directory: Option<PathBuf>,
    pub checksums: Vec<ChecksumAlgorithm>,
    pub deployment_name: Option<String>,
    pub publishing_type: PublishingType,
    pub drop_on_failure: bool,
    pub ignore_already_exists_error: bool,
    pub await_artifact: Option<Coordinates>,
    pub timeout: Duration,
    pub sleep_between_retries: Duration,
    pub status_poll_interval: Duration,
}

impl PublishConfig {
    /// Apply defaults and parse the await-artifact coordinates
    pub fn resolve(self) -> Result<Settings, DeployError> {
        let directory = self.directory.ok_or_else(|| {
            DeployError::Config("The publish directory is not configured".to_string())
        })?;
        let deployment = self.deployment.unwrap_or_default();

        let await_artifact = match deployment.await_artifact.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(Coordinates::parse(value)?),
        };

        let deployment_name = deployment.name.filter(|name| !name.trim().is_empty());

        Ok(Settings {
            directory,
            portal_base_uri: self
                .portal_base_uri
                .unwrap_or_else(|| DEFAULT_PORTAL_BASE_URI.to_string()),
            maven_central_base_uri: self
                .maven_central_base_uri
                .unwrap_or_else(|| DEFAULT_MAVEN_CENTRAL_BASE_URI.to_string()),
            bundle_directory: self.bundle_directory,
            checksums: self
                .checksums
                .unwrap_or_else(|| ChecksumAlgorithm::ALL.to_vec()),
            deployment_name,
            publishing_type: deployment.publishing_type.unwrap_or_default(),
            drop_on_failure: deployment.drop_on_failure.unwrap_or(true),
            ignore_already_exists_error: deployment.ignore_already_exists_error.unwrap_or(false),
            await_artifact,
            timeout: Duration::from_secs(
                deployment.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            ),
            sleep_between_retries: Duration::from_secs(
                deployment
                    .sleep_between_retries_seconds
                    .unwrap_or(DEFAULT_SLEEP_BETWEEN_RETRIES_SECONDS),
            ),
            status_poll_interval: Duration::from_secs(
                deployment
                    .status_poll_interval_seconds
                    .unwrap_or(DEFAULT_STATUS_POLL_INTERVAL_SECONDS),
            ),
        })
    }
}
