//! # svxnotify Core Library
//!
//! Watches an SVX reflector status feed and announces repeater nodes that
//! start talking after a quiet period. The `svxnotify` binary is a thin layer
//! over this crate.
//!
//! ## Architecture
//!
//! - **Node Parser**: validates one untyped feed record into a [`Node`]
//! - **Feed Client**: fetches the status document over HTTP
//! - **Notifier Engine**: polls the feed, tracks last activity per node and
//!   fans activations out to [`Listener`]s
//! - **Role commands**: lets chat members opt in and out of activity pings
//!
//! ## Key Components
//!
//! - [`SvxNotifier`]: polling loop and activity history
//! - [`DiscordWebhook`]: posts announcements to a Discord channel
//! - [`Config`]: TOML configuration

pub mod config;
pub mod error;
pub mod feed;
pub mod listeners;
pub mod logging;
pub mod node;
pub mod notifier;
pub mod roles;

pub use config::Config;
pub use error::{
    ConfigError, CoreError, FeedError, ListenerError, NodeError, NodeErrorKind, NotifierError,
    Result, RoleError,
};
pub use feed::FeedClient;
pub use listeners::{DiscordWebhook, Listener, LogListener};
pub use logging::{init_logging, LoggingGuard};
pub use node::{Node, TalkGroup};
pub use notifier::{is_hidden, ActivityHistory, PollReport, SvxNotifier};
pub use roles::{load_token, DiscordRoles, RoleCommand, RoleService, RoleToggle};
