//! Opt-in role commands.
//!
//! Members subscribe to activity pings with `!svx on` and unsubscribe with
//! `!svx off`. The mention in each announcement targets that role, so holding
//! it is what makes a member hear about activations.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::DiscordConfig;
use crate::error::RoleError;

pub const REPLY_ADDED: &str = "Du får nu notiser om SVX-aktivitet.";
pub const REPLY_REMOVED: &str = "Du får inte längre notiser om SVX-aktivitet.";

/// A recognised role command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleCommand {
    Add,
    Remove,
}

impl RoleCommand {
    /// Parse a chat message. Anything other than the exact commands is `None`.
    pub fn parse(content: &str) -> Option<Self> {
        match content.trim() {
            "!svx on" => Some(Self::Add),
            "!svx off" => Some(Self::Remove),
            _ => None,
        }
    }

    pub fn reply(self) -> &'static str {
        match self {
            Self::Add => REPLY_ADDED,
            Self::Remove => REPLY_REMOVED,
        }
    }
}

/// Grants and revokes a role on the chat platform.
#[async_trait]
pub trait RoleService: Send + Sync {
    async fn add_role(&self, user_id: u64, role_id: u64) -> Result<(), RoleError>;
    async fn remove_role(&self, user_id: u64, role_id: u64) -> Result<(), RoleError>;
}

/// Read the bot token, trimming surrounding whitespace.
pub fn load_token(path: &Path) -> Result<String, RoleError> {
    let raw = std::fs::read_to_string(path).map_err(|source| RoleError::Token {
        path: path.to_path_buf(),
        source,
    })?;
    let token = raw.trim();
    if token.is_empty() {
        return Err(RoleError::EmptyToken(path.to_path_buf()));
    }
    Ok(token.to_string())
}

/// Discord guild member roles over the REST API.
pub struct DiscordRoles {
    api_base: String,
    guild_id: u64,
    token: String,
    http_client: Client,
}

impl DiscordRoles {
    pub fn new(
        api_base: impl Into<String>,
        guild_id: u64,
        token: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, RoleError> {
        let http_client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            api_base: api_base.into(),
            guild_id,
            token: token.into(),
            http_client,
        })
    }

    /// Build from configuration, reading the token file once.
    pub fn from_config(config: &DiscordConfig) -> Result<Self, RoleError> {
        let guild_id = config.guild_id.ok_or(RoleError::MissingSetting("discord.guild_id"))?;
        let token = load_token(&config.token_path)?;
        Self::new(config.api_base.clone(), guild_id, token, config.request_timeout())
    }

    fn member_role_url(&self, user_id: u64, role_id: u64) -> String {
        format!(
            "{}/guilds/{}/members/{}/roles/{}",
            self.api_base.trim_end_matches('/'),
            self.guild_id,
            user_id,
            role_id
        )
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<(), RoleError> {
        let resp = request
            .header("Authorization", format!("Bot {}", self.token))
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(RoleError::Rejected { status, body })
        }
    }
}

#[async_trait]
impl RoleService for DiscordRoles {
    async fn add_role(&self, user_id: u64, role_id: u64) -> Result<(), RoleError> {
        let url = self.member_role_url(user_id, role_id);
        self.send(self.http_client.put(url)).await
    }

    async fn remove_role(&self, user_id: u64, role_id: u64) -> Result<(), RoleError> {
        let url = self.member_role_url(user_id, role_id);
        self.send(self.http_client.delete(url)).await
    }
}

/// Routes chat messages to role changes.
pub struct RoleToggle<S> {
    service: S,
    role_id: u64,
}

impl<S: RoleService> RoleToggle<S> {
    pub fn new(service: S, role_id: u64) -> Self {
        Self { service, role_id }
    }

    /// Handle a message from `author`.
    ///
    /// Returns the reply to post, or `None` when the message is not a command.
    pub async fn handle_message(&self, author: u64, content: &str) -> Result<Option<String>, RoleError> {
        let Some(command) = RoleCommand::parse(content) else {
            return Ok(None);
        };
        self.apply(author, command).await?;
        Ok(Some(command.reply().to_string()))
    }

    pub async fn apply(&self, user_id: u64, command: RoleCommand) -> Result<(), RoleError> {
        match command {
            RoleCommand::Add => self.service.add_role(user_id, self.role_id).await?,
            RoleCommand::Remove => self.service.remove_role(user_id, self.role_id).await?,
        }
        tracing::info!(target: "bot", "Role {:?} for user {user_id}", command);
        Ok(())
    }
}
