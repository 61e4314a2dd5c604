//! A single in-flight Central Portal deployment

use crate::bundle::Bundle;
use crate::core::error::DeployError;
use crate::core::poll::Interrupt;
use crate::core::state_machine::{DeploymentStatus, StatusMachine};
use crate::core::traits::{CentralPortalApi, PublishingType, StatusResponse};
use crate::portal::errors::Errors;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// How the status of a deployment is polled
#[derive(Debug, Clone)]
pub struct StatusPolling {
    pub interval: Duration,
    pub interrupt: Interrupt,
}

impl StatusPolling {
    pub fn new(interval: Duration, interrupt: Interrupt) -> Self {
        Self {
            interval,
            interrupt,
        }
    }
}

/// Deployment created by uploading a bundle
///
/// Only its own poll loop mutates it, one status query at a time.
pub struct Deployment {
    id: String,
    publishing_type: PublishingType,
    bundle: Bundle,
    api: Arc<dyn CentralPortalApi>,
    polling: StatusPolling,
    machine: StatusMachine,
    errors: Errors,
    purls: Vec<String>,
}

impl Deployment {
    /// Upload `bundle` and track the resulting deployment
    pub async fn upload(
        api: Arc<dyn CentralPortalApi>,
        bundle: &Bundle,
        publishing_type: PublishingType,
        name: Option<&str>,
        polling: StatusPolling,
    ) -> Result<Self, DeployError> {
        let id = polling
            .interrupt
            .guard(api.upload(bundle, publishing_type, name))
            .await??;
        Ok(Self::new(id, publishing_type, bundle.clone(), api, polling))
    }

    pub fn new(
        id: String,
        publishing_type: PublishingType,
        bundle: Bundle,
        api: Arc<dyn CentralPortalApi>,
        polling: StatusPolling,
    ) -> Self {
        Self {
            id,
            publishing_type,
            bundle,
            api,
            polling,
            machine: StatusMachine::new(),
            errors: Errors::empty(),
            purls: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn publishing_type(&self) -> PublishingType {
        self.publishing_type
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    pub fn status(&self) -> DeploymentStatus {
        self.machine.current()
    }

    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    /// Package urls of the deployed components
    pub fn purls(&self) -> &[String] {
        &self.purls
    }

    /// Timestamped status history
    pub fn history(&self) -> String {
        self.machine.history()
    }

    /// Query the status once and apply it
    pub async fn refresh(&mut self) -> Result<DeploymentStatus, DeployError> {
        let response = self.polling.interrupt.guard(self.api.status(&self.id)).await??;
        self.apply(response)
    }

    /// Poll until the deployment reaches a terminal status
    ///
    /// There is no timeout: how long validation and publishing take is up to
    /// the portal. An unknown status also ends the loop, the caller decides
    /// what to do with it.
    pub async fn await_final_status(&mut self) -> Result<DeploymentStatus, DeployError> {
        loop {
            let status = self.refresh().await?;
            if status.is_terminal() || status == DeploymentStatus::Unknown {
                debug!(deployment = %self.id, history = %self.history(), "final status reached");
                return Ok(status);
            }
            self.polling.interrupt.pause(self.polling.interval).await?;
        }
    }

    /// Drop the deployment on the portal
    pub async fn drop_deployment(&self) -> Result<(), DeployError> {
        self.api.drop_deployment(&self.id).await
    }

    fn apply(&mut self, response: StatusResponse) -> Result<DeploymentStatus, DeployError> {
        let status = response.deployment_state;
        let changed = self
            .machine
            .transition(status)
            .map_err(|regression| DeployError::StatusRegression {
                id: self.id.clone(),
                from: regression.from,
                to: regression.to,
            })?;
        if changed {
            info!(deployment = %self.id, %status, "deployment status changed");
        }

        self.errors = Errors::from_raw(response.errors.as_ref());
        if !response.purls.is_empty() {
            self.purls = response.purls;
        }

        Ok(status)
    }
}

impl std::fmt::Debug for Deployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deployment")
            .field("id", &self.id)
            .field("publishing_type", &self.publishing_type)
            .field("status", &self.status())
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}
