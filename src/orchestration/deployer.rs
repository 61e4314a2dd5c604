//! Deployer - Main orchestrator for Central Portal deployments
//!
//! Runs the complete publish-and-await pipeline:
//! - Scanning the publish directory and creating checksum files
//! - Bundling and uploading to the Central Portal
//! - Polling the deployment until it reaches a final status
//! - Applying the failure policy (ignore duplicates, drop on failure)
//! - Optionally waiting for the artifact on Maven Central

use crate::bundle::{Bundle, Bundler, ChecksumCreator, FileScanner};
use crate::core::config::Settings;
use crate::core::coordinates::Coordinates;
use crate::core::error::DeployError;
use crate::core::poll::Interrupt;
use crate::core::state_machine::DeploymentStatus;
use crate::core::traits::{ArtifactProbe, CentralPortalApi, PublishingType};
use crate::orchestration::artifact_awaiter::ArtifactAwaiter;
use crate::portal::{Deployment, StatusPolling};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Final outcome of a deployment run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployResult {
    Success,
    Failure,
}

impl DeployResult {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// User policy applied to a deployment
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    pub publishing_type: PublishingType,
    pub deployment_name: Option<String>,
    pub drop_on_failure: bool,
    pub ignore_already_exists_error: bool,
    pub await_artifact: Option<Coordinates>,
}

impl From<&Settings> for DeployOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            publishing_type: settings.publishing_type,
            deployment_name: settings.deployment_name.clone(),
            drop_on_failure: settings.drop_on_failure,
            ignore_already_exists_error: settings.ignore_already_exists_error,
            await_artifact: settings.await_artifact.clone(),
        }
    }
}

impl DeployOptions {
    /// Check preconditions that need no I/O
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.await_artifact.is_some() && self.publishing_type != PublishingType::Automatic {
            return Err(DeployError::AwaitArtifactRequiresAutomatic);
        }
        Ok(())
    }
}

/// Main deployment orchestrator
pub struct Deployer {
    directory: PathBuf,
    scanner: FileScanner,
    checksums: ChecksumCreator,
    bundler: Bundler,
    keep_bundle: bool,
    portal: Arc<dyn CentralPortalApi>,
    awaiter: ArtifactAwaiter,
    polling: StatusPolling,
    options: DeployOptions,
}

impl Deployer {
    /// Create a deployer for resolved `settings`
    ///
    /// # Arguments
    ///
    /// * `settings` - Resolved configuration
    /// * `portal` - Central Portal API
    /// * `probe` - Existence check used when awaiting the artifact
    /// * `interrupt` - Signal aborting every pause of the run
    pub fn new(
        settings: &Settings,
        portal: Arc<dyn CentralPortalApi>,
        probe: Arc<dyn ArtifactProbe>,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            directory: settings.directory.clone(),
            scanner: FileScanner::new(),
            checksums: ChecksumCreator::new(settings.checksums.clone()),
            bundler: Bundler::new(
                settings
                    .bundle_directory
                    .clone()
                    .unwrap_or_else(std::env::temp_dir),
            ),
            keep_bundle: settings.bundle_directory.is_some(),
            portal,
            awaiter: ArtifactAwaiter::new(
                probe,
                settings.timeout,
                settings.sleep_between_retries,
                interrupt.clone(),
            ),
            polling: StatusPolling::new(settings.status_poll_interval, interrupt),
            options: DeployOptions::from(settings),
        }
    }

    pub fn options(&self) -> &DeployOptions {
        &self.options
    }

    pub fn validate(&self) -> Result<(), DeployError> {
        self.options.validate()
    }

    /// Run the whole pipeline
    ///
    /// Returns [`DeployResult::Failure`] when the portal rejected the
    /// deployment. Errors are reserved for broken preconditions, transport
    /// failures and protocol contract violations.
    pub async fn deploy(&self) -> Result<DeployResult, DeployError> {
        self.validate()?;

        let files = self.scanner.scan(&self.directory)?;
        if files.is_empty() {
            return Err(DeployError::NoFilesFound {
                root: self.directory.clone(),
            });
        }
        info!(directory = %self.directory.display(), files = files.len(), "collected files");

        let checksums = self.checksums.create_checksums(&files)?;
        let files = files.plus(&checksums)?;

        let bundle = self.bundler.create_bundle(&self.directory, &files)?;
        info!(bundle = %bundle.path().display(), size = bundle.size(), "created bundle");

        let uploaded = Deployment::upload(
            Arc::clone(&self.portal),
            &bundle,
            self.options.publishing_type,
            self.options.deployment_name.as_deref(),
            self.polling.clone(),
        )
        .await;
        if !self.keep_bundle {
            discard_bundle(&bundle);
        }
        let mut deployment = uploaded?;
        info!(
            deployment = deployment.id(),
            publishing_type = %self.options.publishing_type,
            "uploaded bundle"
        );

        let status = deployment.await_final_status().await?;

        match status {
            DeploymentStatus::Failed => self.handle_failure(&deployment).await,
            DeploymentStatus::Published => self.handle_published(&deployment).await,
            DeploymentStatus::Validated => self.handle_validated(&deployment),
            DeploymentStatus::Pending
            | DeploymentStatus::Validating
            | DeploymentStatus::Publishing
            | DeploymentStatus::Unknown => Err(DeployError::UnexpectedStatus {
                status: status.to_string(),
            }),
        }
    }

    async fn handle_failure(&self, deployment: &Deployment) -> Result<DeployResult, DeployError> {
        let errors = deployment.errors();
        error!(deployment = deployment.id(), "deployment failed:\n{}", errors);

        if self.options.ignore_already_exists_error && errors.has_only_already_exists_error() {
            info!(
                deployment = deployment.id(),
                "all components already exist, treating deployment as successful"
            );
            return Ok(DeployResult::Success);
        }

        if self.options.drop_on_failure {
            match deployment.drop_deployment().await {
                Ok(()) => info!(deployment = deployment.id(), "dropped failed deployment"),
                Err(e) => warn!(
                    deployment = deployment.id(),
                    error = %e,
                    "failed to drop deployment"
                ),
            }
        }

        Ok(DeployResult::Failure)
    }

    async fn handle_published(&self, deployment: &Deployment) -> Result<DeployResult, DeployError> {
        if self.options.publishing_type == PublishingType::UserManaged {
            return Err(DeployError::PublishedUnderUserManaged);
        }

        info!(
            deployment = deployment.id(),
            purls = ?deployment.purls(),
            "deployment published"
        );

        if let Some(coordinates) = &self.options.await_artifact {
            self.awaiter.await_artifact(coordinates).await?;
        }

        Ok(DeployResult::Success)
    }

    fn handle_validated(&self, deployment: &Deployment) -> Result<DeployResult, DeployError> {
        if self.options.publishing_type == PublishingType::Automatic {
            return Err(DeployError::ValidatedUnderAutomatic);
        }

        info!(
            deployment = deployment.id(),
            "deployment validated, publish it manually on the Central Portal"
        );
        Ok(DeployResult::Success)
    }
}

/// Temporary bundles are removed once uploaded, a leftover file is only logged
fn discard_bundle(bundle: &Bundle) {
    match bundle.remove() {
        Ok(()) => debug!(bundle = %bundle.path().display(), "removed temporary bundle"),
        Err(e) => warn!(error = %e, "failed to remove temporary bundle"),
    }
}

impl std::fmt::Debug for Deployer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deployer")
            .field("directory", &self.directory)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
