//! Core traits and types for Central Portal publishing
//!
//! This module defines the seams between the deployment pipeline and the
//! network: the Central Portal publisher API and the artifact existence probe.

use crate::bundle::Bundle;
use crate::core::error::DeployError;
use crate::core::state_machine::DeploymentStatus;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ============================================================================
// Publishing Type
// ============================================================================

/// How the portal proceeds once a deployment is validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishingType {
    /// Publish right after validation
    #[default]
    Automatic,
    /// Stop at VALIDATED, publishing is a manual step on the portal
    UserManaged,
}

impl PublishingType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Automatic => "AUTOMATIC",
            Self::UserManaged => "USER_MANAGED",
        }
    }
}

impl fmt::Display for PublishingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PublishingType {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "AUTOMATIC" => Ok(Self::Automatic),
            "USER_MANAGED" => Ok(Self::UserManaged),
            other => Err(DeployError::Config(format!(
                "Unknown publishing type '{}', expected AUTOMATIC or USER_MANAGED",
                other
            ))),
        }
    }
}

// ============================================================================
// Status
// ============================================================================

/// Response of the status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(default)]
    pub deployment_id: Option<String>,
    #[serde(default)]
    pub deployment_name: Option<String>,
    pub deployment_state: DeploymentStatus,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub purls: Vec<String>,
    /// Raw error payload, normalized by [`crate::portal::Errors`]
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

/// An explicit `null` reads as an empty list
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Central Portal API
// ============================================================================

/// Publisher API of the Central Portal
#[async_trait]
pub trait CentralPortalApi: Send + Sync {
    /// Upload a bundle, returning the deployment id assigned by the portal
    ///
    /// # Arguments
    ///
    /// * `bundle` - The bundle to upload
    /// * `publishing_type` - What the portal does after validation
    /// * `name` - Optional human readable deployment name
    async fn upload(
        &self,
        bundle: &Bundle,
        publishing_type: PublishingType,
        name: Option<&str>,
    ) -> Result<String, DeployError>;

    /// Query the current status of a deployment
    async fn status(&self, deployment_id: &str) -> Result<StatusResponse, DeployError>;

    /// Drop a deployment
    async fn drop_deployment(&self, deployment_id: &str) -> Result<(), DeployError>;
}

// ============================================================================
// Artifact Probe
// ============================================================================

/// Outcome of one existence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Available,
    /// Non-2xx status or a transient transport failure
    NotYetAvailable,
}

/// Existence check against a public Maven repository
#[async_trait]
pub trait ArtifactProbe: Send + Sync {
    /// Full url probed for `path`, for diagnostics
    fn url_for(&self, path: &str) -> Result<String, DeployError>;

    /// Check whether `path` (relative to the repository root) exists
    ///
    /// Only fatal problems, like a url that cannot be built, are errors.
    async fn probe(&self, path: &str) -> Result<ProbeOutcome, DeployError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publishing_type_serialization() {
        let json = serde_json::to_string(&PublishingType::UserManaged).unwrap();
        assert_eq!(json, r#""USER_MANAGED""#);

        let parsed: PublishingType = serde_json::from_str(r#""AUTOMATIC""#).unwrap();
        assert_eq!(parsed, PublishingType::Automatic);
    }

    #[test]
    fn test_publishing_type_from_str() {
        assert_eq!(
            "user-managed".parse::<PublishingType>().unwrap(),
            PublishingType::UserManaged
        );
        assert_eq!(
            "automatic".parse::<PublishingType>().unwrap(),
            PublishingType::Automatic
        );
        assert!("manual".parse::<PublishingType>().is_err());
    }

    #[test]
    fn test_publishing_type_default() {
        assert_eq!(PublishingType::default(), PublishingType::Automatic);
    }

    #[test]
    fn test_status_response_deserialization() {
        let json = r#"{
            "deploymentId": "28570f16-da32-4c14-bd2e-c1acc0782365",
            "deploymentName": "central-bundle.zip",
            "deploymentState": "FAILED",
            "purls": ["pkg:maven/com.example/lib@1.0.0"],
            "errors": {"pkg:maven/com.example/lib@1.0.0": ["broken"]}
        }"#;

        let response: StatusResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.deployment_state, DeploymentStatus::Failed);
        assert_eq!(response.purls.len(), 1);
        assert!(response.errors.is_some());
    }

    #[test]
    fn test_status_response_minimal() {
        let response: StatusResponse =
            serde_json::from_str(r#"{"deploymentState": "VALIDATING"}"#).unwrap();

        assert_eq!(response.deployment_state, DeploymentStatus::Validating);
        assert!(response.purls.is_empty());
        assert!(response.errors.is_none());
    }

    #[test]
    fn test_status_response_null_fields() {
        let json = r#"{
            "deploymentId": "d-1",
            "deploymentState": "FAILED",
            "purls": null,
            "errors": null
        }"#;

        let response: StatusResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.deployment_state, DeploymentStatus::Failed);
        assert!(response.purls.is_empty());
        assert!(response.errors.is_none());
    }
}
