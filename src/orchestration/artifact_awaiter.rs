//! Waits until a published artifact is resolvable from Maven Central

use crate::core::coordinates::Coordinates;
use crate::core::error::DeployError;
use crate::core::poll::Interrupt;
use crate::core::traits::{ArtifactProbe, ProbeOutcome};
use crate::portal::client::parse_base_url;
use crate::portal::USER_AGENT;
use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Probes artifacts with `HEAD` requests against a Maven repository
pub struct HttpArtifactProbe {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpArtifactProbe {
    pub fn new(base_url: &str) -> Result<Self, DeployError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url: parse_base_url(base_url)?,
        })
    }
}

#[async_trait]
impl ArtifactProbe for HttpArtifactProbe {
    fn url_for(&self, path: &str) -> Result<String, DeployError> {
        self.base_url
            .join(path)
            .map(String::from)
            .map_err(|e| DeployError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
                message: e.to_string(),
            })
    }

    async fn probe(&self, path: &str) -> Result<ProbeOutcome, DeployError> {
        let url = self.url_for(path)?;
        match self.http.head(&url).send().await {
            Ok(response) if response.status().is_success() => Ok(ProbeOutcome::Available),
            Ok(response) => {
                debug!(%url, status = response.status().as_u16(), "artifact not found yet");
                Ok(ProbeOutcome::NotYetAvailable)
            }
            Err(e) if e.is_builder() => Err(DeployError::Http(e)),
            Err(e) => {
                warn!(%url, error = %e, "artifact probe failed, retrying");
                Ok(ProbeOutcome::NotYetAvailable)
            }
        }
    }
}

/// Polls an [`ArtifactProbe`] until an artifact appears or the timeout is hit
#[derive(Clone)]
pub struct ArtifactAwaiter {
    probe: Arc<dyn ArtifactProbe>,
    timeout: Duration,
    sleep_between_retries: Duration,
    interrupt: Interrupt,
}

impl ArtifactAwaiter {
    pub fn new(
        probe: Arc<dyn ArtifactProbe>,
        timeout: Duration,
        sleep_between_retries: Duration,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            probe,
            timeout,
            sleep_between_retries,
            interrupt,
        }
    }

    /// Wait until the main jar of `coordinates` is available
    ///
    /// The timeout is checked before every probe, so a zero timeout never
    /// probes at all.
    pub async fn await_artifact(&self, coordinates: &Coordinates) -> Result<(), DeployError> {
        let path = coordinates.jar_path();
        let url = self.probe.url_for(&path)?;
        let start = Instant::now();
        let mut attempts: u32 = 0;

        info!(%coordinates, %url, timeout = ?self.timeout, "waiting for artifact");

        loop {
            if start.elapsed() >= self.timeout {
                return Err(DeployError::ArtifactAwaitTimeout {
                    timeout: self.timeout,
                    coordinates: coordinates.clone(),
                    url,
                });
            }

            attempts += 1;
            let outcome = self.interrupt.guard(self.probe.probe(&path)).await??;
            if outcome == ProbeOutcome::Available {
                info!(%coordinates, attempts, elapsed = ?start.elapsed(), "artifact is available");
                return Ok(());
            }

            self.interrupt.pause(self.sleep_between_retries).await?;
        }
    }
}

impl std::fmt::Debug for ArtifactAwaiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactAwaiter")
            .field("timeout", &self.timeout)
            .field("sleep_between_retries", &self.sleep_between_retries)
            .finish_non_exhaustive()
    }
}
