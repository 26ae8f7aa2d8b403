//! Discord listener -- post activation notices via webhook.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use url::Url;

use super::{format_activation, Listener};
use crate::error::ListenerError;
use crate::node::Node;

const WEBHOOK_PREFIX: &str = "https://discord.com/api/webhooks/";

pub struct DiscordWebhook {
    webhook_url: String,
    role_id: Option<u64>,
    http_client: Client,
}

impl DiscordWebhook {
    /// Create a webhook listener whose requests give up after `request_timeout`.
    pub fn new(webhook_url: impl Into<String>, request_timeout: Duration) -> Result<Self, ListenerError> {
        let http_client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|source| ListenerError::Request {
                listener: "discord".to_string(),
                source,
            })?;

        Ok(Self {
            webhook_url: webhook_url.into(),
            role_id: None,
            http_client,
        })
    }

    /// Mention this role in every notice.
    pub fn with_role(mut self, role_id: Option<u64>) -> Self {
        self.role_id = role_id;
        self
    }

    /// Check that the URL looks like a Discord webhook.
    pub fn validate(&self) -> Result<(), ListenerError> {
        let not_configured = |message: &str| ListenerError::NotConfigured {
            listener: self.name().to_string(),
            message: message.to_string(),
        };

        if self.webhook_url.is_empty() {
            return Err(not_configured("webhook URL is empty"));
        }
        Url::parse(&self.webhook_url).map_err(|e| not_configured(&e.to_string()))?;
        if !self.webhook_url.starts_with(WEBHOOK_PREFIX) {
            return Err(not_configured(
                "webhook URL must start with https://discord.com/api/webhooks/",
            ));
        }
        Ok(())
    }

    /// Post a message to the configured Discord webhook.
    pub async fn post_message(&self, content: &str) -> Result<(), ListenerError> {
        if self.webhook_url.is_empty() {
            return Err(ListenerError::NotConfigured {
                listener: self.name().to_string(),
                message: "Discord webhook URL not configured".to_string(),
            });
        }

        let body = json!({ "content": content });
        let resp = self
            .http_client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .map_err(|source| ListenerError::Request {
                listener: self.name().to_string(),
                source,
            })?;

        if resp.status().is_success() {
            tracing::info!(target: "bot", "Sent {content:?}");
            Ok(())
        } else {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            Err(ListenerError::Delivery {
                listener: self.name().to_string(),
                status,
                body: text,
            })
        }
    }
}

#[async_trait]
impl Listener for DiscordWebhook {
    fn name(&self) -> &str {
        "discord"
    }

    async fn on_activation(&self, node: &Node, elapsed: Option<Duration>) -> Result<(), ListenerError> {
        self.post_message(&format_activation(node, elapsed, self.role_id))
            .await
    }
}
