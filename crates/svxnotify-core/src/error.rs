//! Core error types for svxnotify-core.
//!
//! This module defines the error hierarchy used across the library, built
//! with thiserror. Parser, feed, listener and role errors each have their
//! own enum; [`CoreError`] wraps them for callers that do not care which
//! layer failed.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Core error type for svxnotify-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Status feed errors
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    /// Notification listener errors
    #[error("Listener error: {0}")]
    Listener(#[from] ListenerError),

    /// Role command errors
    #[error("Role error: {0}")]
    Role(#[from] RoleError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// A node record that failed validation.
///
/// Carries the node name so the caller can log which entry of the feed was
/// rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid record for node '{node}': {kind}")]
pub struct NodeError {
    pub node: String,
    pub kind: NodeErrorKind,
}

impl NodeError {
    pub fn new(node: impl Into<String>, kind: NodeErrorKind) -> Self {
        Self {
            node: node.into(),
            kind,
        }
    }
}

/// The first structural violation found in a node record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeErrorKind {
    /// The record itself is not a JSON object
    #[error("record is not an object")]
    NotAnObject,

    /// A required key is absent
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// A key is present but holds the wrong JSON type
    #[error("field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// Status feed errors.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Request could not be sent or the body could not be read
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("Feed returned HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Failed to build the HTTP client
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Errors raised by notification listeners.
#[derive(Error, Debug)]
pub enum ListenerError {
    /// Listener is missing configuration it needs to deliver
    #[error("Listener '{listener}' is not configured: {message}")]
    NotConfigured { listener: String, message: String },

    /// HTTP request to the chat platform failed
    #[error("Listener '{listener}' request failed: {source}")]
    Request {
        listener: String,
        #[source]
        source: reqwest::Error,
    },

    /// Chat platform rejected the message
    #[error("Listener '{listener}' delivery failed (HTTP {status}): {body}")]
    Delivery {
        listener: String,
        status: u16,
        body: String,
    },

    /// The fan-out did not settle in time
    #[error("Listeners did not finish within {0:?}")]
    Timeout(Duration),
}

/// Role command errors.
#[derive(Error, Debug)]
pub enum RoleError {
    /// Bot token could not be read
    #[error("Failed to read token from {path}: {source}")]
    Token {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Token file exists but is empty
    #[error("Token file {0} is empty")]
    EmptyToken(PathBuf),

    /// Required id missing from configuration
    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),

    /// HTTP request failed
    #[error("Role request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Platform rejected the role change
    #[error("Role change rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Could not determine the configuration directory
    #[error("Failed to access config directory: {0}")]
    DataDir(String),
}

/// Errors that end a single poll cycle early.
///
/// Structural problems with the feed are not errors; they are logged and the
/// cycle returns normally. What remains here is what the polling loop has to
/// decide about.
#[derive(Error, Debug)]
pub enum NotifierError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

impl NotifierError {
    /// Whether the failure came from the network and is worth backing off on.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            NotifierError::Feed(FeedError::Transport { .. } | FeedError::Status { .. })
        )
    }
}

impl From<NotifierError> for CoreError {
    fn from(err: NotifierError) -> Self {
        match err {
            NotifierError::Feed(e) => CoreError::Feed(e),
            NotifierError::Listener(e) => CoreError::Listener(e),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
