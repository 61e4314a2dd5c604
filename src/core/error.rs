//! Error handling for Central Portal deployments
//!
//! This module provides the error taxonomy of the publish-and-await pipeline
//! with recovery guidance, using the thiserror crate.

use crate::core::coordinates::Coordinates;
use crate::core::state_machine::DeploymentStatus;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for deployment operations
#[derive(Error, Debug)]
pub enum DeployError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Expected 3 parts, got {parts} for '{input}'")]
    InvalidCoordinates { input: String, parts: usize },

    #[error("Await artifact can only be used if publishing type is automatic")]
    AwaitArtifactRequiresAutomatic,

    #[error("Credentials are not set (expected {username_var} and {password_var})")]
    MissingCredentials {
        username_var: &'static str,
        password_var: &'static str,
    },

    // Input errors
    #[error("No files found in directory '{}'", .root.display())]
    NoFilesFound { root: PathBuf },

    #[error("Cannot merge files below '{}' with files below '{}'", .left.display(), .right.display())]
    FileSetRootMismatch { left: PathBuf, right: PathBuf },

    // Protocol contract violations
    #[error(
        "Publishing type USER_MANAGED should only have states FAILED or VALIDATED, but got PUBLISHED"
    )]
    PublishedUnderUserManaged,

    #[error(
        "Publishing type AUTOMATIC should only have states FAILED or PUBLISHED, but got VALIDATED"
    )]
    ValidatedUnderAutomatic,

    #[error("Unexpected deployment status value {status}")]
    UnexpectedStatus { status: String },

    #[error("Deployment '{id}' went back from {from} to {to}")]
    StatusRegression {
        id: String,
        from: DeploymentStatus,
        to: DeploymentStatus,
    },

    // Awaiting errors
    #[error("Timeout of {timeout:?} reached while waiting for artifact {coordinates} at url '{url}'")]
    ArtifactAwaitTimeout {
        timeout: Duration,
        coordinates: Coordinates,
        url: String,
    },

    #[error("Interrupted before the run finished")]
    Interrupted,

    // Transport errors
    #[error("Invalid url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Central Portal returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Local I/O errors
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write bundle: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl DeployError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error signals a broken contract between client and portal
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::PublishedUnderUserManaged
                | Self::ValidatedUnderAutomatic
                | Self::UnexpectedStatus { .. }
                | Self::StatusRegression { .. }
        )
    }

    /// Whether this error is raised before any network activity
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::InvalidCoordinates { .. }
                | Self::AwaitArtifactRequiresAutomatic
                | Self::MissingCredentials { .. }
        )
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::Config(_) => vec!["Check .central-publish.yaml and CENTRAL_PUBLISH_* variables"],
            Self::InvalidCoordinates { .. } => {
                vec!["Use the form group:artifact:version for await-artifact"]
            }
            Self::AwaitArtifactRequiresAutomatic => vec![
                "Set the publishing type to AUTOMATIC",
                "Or remove the await-artifact setting",
            ],
            Self::MissingCredentials { .. } => vec![
                "Generate a user token on the Central Portal",
                "Export it as CENTRAL_USERNAME and CENTRAL_PASSWORD",
            ],
            Self::NoFilesFound { .. } => vec![
                "Check that the build staged its artifacts into the publish directory",
            ],
            Self::FileSetRootMismatch { .. } => {
                vec!["Create checksums in the publish directory that was scanned"]
            }
            Self::PublishedUnderUserManaged
            | Self::ValidatedUnderAutomatic
            | Self::UnexpectedStatus { .. }
            | Self::StatusRegression { .. } => vec![
                "Inspect the deployment on the Central Portal",
                "Report the status sequence, the portal API may have changed",
            ],
            Self::ArtifactAwaitTimeout { .. } => vec![
                "The deployment is published, syncing to Maven Central can take a while",
                "Increase deployment.timeout_seconds",
            ],
            Self::Interrupted => vec!["Re-run the deployment, partial progress is not resumed"],
            Self::InvalidUrl { .. } => vec!["Check portal_base_uri and maven_central_base_uri"],
            Self::Http(_) | Self::Api { .. } => vec![
                "Check network connectivity",
                "Check the Central Portal status page",
            ],
            Self::Json(_) => vec!["The Central Portal returned an unexpected payload"],
            Self::Io { .. } | Self::Archive(_) => {
                vec!["Check permissions and free space in the publish and bundle directories"]
            }
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidCoordinates { .. } => "INVALID_COORDINATES",
            Self::AwaitArtifactRequiresAutomatic => "AWAIT_ARTIFACT_REQUIRES_AUTOMATIC",
            Self::MissingCredentials { .. } => "MISSING_CREDENTIALS",
            Self::NoFilesFound { .. } => "NO_FILES_FOUND",
            Self::FileSetRootMismatch { .. } => "FILE_SET_ROOT_MISMATCH",
            Self::PublishedUnderUserManaged => "PUBLISHED_UNDER_USER_MANAGED",
            Self::ValidatedUnderAutomatic => "VALIDATED_UNDER_AUTOMATIC",
            Self::UnexpectedStatus { .. } => "UNEXPECTED_STATUS",
            Self::StatusRegression { .. } => "STATUS_REGRESSION",
            Self::ArtifactAwaitTimeout { .. } => "ARTIFACT_AWAIT_TIMEOUT",
            Self::Interrupted => "INTERRUPTED",
            Self::InvalidUrl { .. } => "INVALID_URL",
            Self::Http(_) => "HTTP_ERROR",
            Self::Api { .. } => "API_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::Archive(_) => "ARCHIVE_ERROR",
        }
    }
}
