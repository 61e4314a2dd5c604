//! Central Portal publisher API client.
//!
//! Async HTTP client using `reqwest` with Bearer token authentication.

use crate::bundle::Bundle;
use crate::core::error::DeployError;
use crate::core::traits::{CentralPortalApi, PublishingType, StatusResponse};
use crate::security::PortalCredentials;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use secrecy::ExposeSecret;
use tracing::debug;

const UPLOAD_ENDPOINT: &str = "api/v1/publisher/upload";
const STATUS_ENDPOINT: &str = "api/v1/publisher/status";
const DEPLOYMENT_ENDPOINT: &str = "api/v1/publisher/deployment/";

pub const USER_AGENT: &str = concat!("central-publisher/", env!("CARGO_PKG_VERSION"));

/// Client for the publisher API of the Central Portal
pub struct PortalClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PortalClient {
    /// Creates a client authenticating with `credentials`
    pub fn new(base_url: &str, credentials: &PortalCredentials) -> Result<Self, DeployError> {
        let mut token = HeaderValue::from_str(credentials.bearer_token().expose_secret())
            .map_err(|_| DeployError::Config("Credentials contain invalid characters".into()))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, token);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url: parse_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, DeployError> {
        self.base_url
            .join(path)
            .map_err(|e| DeployError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
                message: e.to_string(),
            })
    }
}

/// Parse a base url, making sure relative joins keep its path
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, DeployError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized).map_err(|e| DeployError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })
}

/// Turn a non-2xx response into [`DeployError::Api`]
async fn ensure_success(response: Response) -> Result<Response, DeployError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DeployError::Api {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl CentralPortalApi for PortalClient {
    async fn upload(
        &self,
        bundle: &Bundle,
        publishing_type: PublishingType,
        name: Option<&str>,
    ) -> Result<String, DeployError> {
        let data = tokio::fs::read(bundle.path())
            .await
            .map_err(|e| DeployError::io(bundle.path(), e))?;
        let part = Part::bytes(data)
            .file_name(bundle.file_name())
            .mime_str("application/octet-stream")?;
        let form = Form::new().part("bundle", part);

        let mut query = vec![("publishingType", publishing_type.as_str().to_string())];
        if let Some(name) = name {
            query.push(("name", name.to_string()));
        }

        let url = self.endpoint(UPLOAD_ENDPOINT)?;
        debug!(%url, size = bundle.size(), %publishing_type, "uploading bundle");
        let response = self
            .http
            .post(url)
            .query(&query)
            .multipart(form)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let status = response.status().as_u16();

        let id = response.text().await?.trim().to_string();
        if id.is_empty() {
            return Err(DeployError::Api {
                status,
                body: "Upload response did not contain a deployment id".to_string(),
            });
        }
        Ok(id)
    }

    async fn status(&self, deployment_id: &str) -> Result<StatusResponse, DeployError> {
        let url = self.endpoint(STATUS_ENDPOINT)?;
        let response = self
            .http
            .post(url)
            .query(&[("id", deployment_id)])
            .send()
            .await?;
        let body = ensure_success(response).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn drop_deployment(&self, deployment_id: &str) -> Result<(), DeployError> {
        let url = self.endpoint(&format!("{}{}", DEPLOYMENT_ENDPOINT, deployment_id))?;
        debug!(%url, "dropping deployment");
        let response = self.http.delete(url).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}

impl std::fmt::Debug for PortalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}
