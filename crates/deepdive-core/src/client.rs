use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::ApiError;
use crate::protocol::{ProbeRequest, Query, Response};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8765/api";

/// The answering backend, as seen by the session and the prober
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Send a query and decode the reply
    async fn ask(&self, query: &Query) -> Result<Response, ApiError>;

    /// Send the probe payload; `Ok` means the backend answered with 2xx
    async fn probe(&self) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    url: String,
}

impl ApiClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
        }
    }

    /// Like `new`, but every request gives up after `timeout`
    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn ask(&self, query: &Query) -> Result<Response, ApiError> {
        debug!(mode = %query.mode, dive_confirmed = query.dive_confirmed, "posting query");

        // `.json()` sets Content-Type: application/json
        let response = self.client.post(&self.url).json(query).send().await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }

        let body = response.bytes().await?;
        let decoded = Response::from_slice(&body)?;
        debug!(status = decoded.status.as_str(), "backend replied");
        Ok(decoded)
    }

    async fn probe(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .post(&self.url)
            .json(&ProbeRequest::default())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }
        Ok(())
    }
}
