//! HTTP client for the reflector status feed.

use std::time::Duration;

use reqwest::Client;

use crate::config::FeedConfig;
use crate::error::FeedError;

/// Fetches the raw status document, one request per poll cycle.
#[derive(Debug, Clone)]
pub struct FeedClient {
    endpoint: String,
    http_client: Client,
}

impl FeedClient {
    /// Build a client for the configured endpoint with a bounded request timeout.
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(FeedError::Client)?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            http_client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the status document body.
    ///
    /// The reflector proxy labels its JSON as `text/html`, so the body is
    /// returned as text and the content type is never looked at.
    pub async fn fetch(&self) -> Result<String, FeedError> {
        let resp = self
            .http_client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|source| self.transport(source))?;

        if !resp.status().is_success() {
            return Err(FeedError::Status {
                url: self.endpoint.clone(),
                status: resp.status().as_u16(),
            });
        }

        resp.text().await.map_err(|source| self.transport(source))
    }

    fn transport(&self, source: reqwest::Error) -> FeedError {
        FeedError::Transport {
            url: self.endpoint.clone(),
            source,
        }
    }
}
