//! Notification listeners.
//!
//! Every sink that wants to hear about node activations implements
//! [`Listener`]. The notifier calls all registered listeners concurrently for
//! each activation and waits for every one of them to finish.

pub mod discord;

pub use discord::DiscordWebhook;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ListenerError;
use crate::node::Node;

/// Receives node activations from the notifier.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Short identifier used in log lines.
    fn name(&self) -> &str;

    /// Called when `node` starts talking after a quiet period.
    ///
    /// `elapsed` is the time since the node was last seen active, or `None`
    /// the first time this process sees the node.
    async fn on_activation(&self, node: &Node, elapsed: Option<Duration>) -> Result<(), ListenerError>;
}

/// Writes activations to the log.
#[derive(Debug, Default)]
pub struct LogListener;

#[async_trait]
impl Listener for LogListener {
    fn name(&self) -> &str {
        "log"
    }

    async fn on_activation(&self, node: &Node, elapsed: Option<Duration>) -> Result<(), ListenerError> {
        match elapsed {
            Some(elapsed) => tracing::info!(
                target: "handler",
                "Node {} activated, first time in {}",
                node.name,
                format_elapsed(elapsed)
            ),
            None => tracing::info!(target: "handler", "Node {} activated", node.name),
        }
        Ok(())
    }
}

/// Render a quiet period as `h:mm`, rounding minutes half-up.
///
/// Minutes are rounded independently of hours, so 3599.9 s renders as `0:60`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    let hours = (secs / 3600.0).floor() as u64;
    let minutes = ((secs % 3600.0) / 60.0 + 0.5).floor() as u64;
    format!("{hours}:{minutes:02}")
}

/// Build the chat announcement for an activation.
pub fn format_activation(node: &Node, elapsed: Option<Duration>, role_id: Option<u64>) -> String {
    let talk_group = node
        .talk_group
        .map(|tg| tg.to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut msg = format!(
        "Nod **{}** i **{}** gick igång på talk group **{}**",
        node.name, node.location, talk_group
    );
    if let Some(role) = role_id {
        msg.push_str(&format!(" <@&{role}>"));
    }
    msg.push_str("!!! ");

    if let Some(elapsed) = elapsed {
        msg.push_str(&format!(
            "Denna station har inte sagt någonting på {} minuter",
            format_elapsed(elapsed)
        ));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TalkGroup;
    use std::collections::BTreeMap;

    fn node(talk_group: Option<i64>) -> Node {
        Node {
            name: "SK0MMR".into(),
            location: "Stockholm".into(),
            monitoring_talkgroups: vec![TalkGroup(240)],
            is_talking: true,
            talk_group: talk_group.map(TalkGroup),
            talkgroup_tones: BTreeMap::new(),
        }
    }

    #[test]
    fn format_elapsed_rounds_minutes_half_up() {
        assert_eq!(format_elapsed(Duration::from_secs(3725)), "1:02");
        assert_eq!(format_elapsed(Duration::from_secs(601)), "0:10");
        assert_eq!(format_elapsed(Duration::from_secs(630)), "0:11");
        assert_eq!(format_elapsed(Duration::from_secs(7200)), "2:00");
    }

    #[test]
    fn format_elapsed_keeps_sixty_at_hour_edge() {
        assert_eq!(format_elapsed(Duration::from_secs_f64(3599.9)), "0:60");
    }

    #[test]
    fn first_activation_has_no_quiet_period() {
        let msg = format_activation(&node(Some(240)), None, Some(42));
        assert_eq!(
            msg,
            "Nod **SK0MMR** i **Stockholm** gick igång på talk group **240** <@&42>!!! "
        );
    }

    #[test]
    fn repeated_activation_mentions_quiet_period() {
        let msg = format_activation(&node(Some(240)), Some(Duration::from_secs(3725)), None);
        assert_eq!(
            msg,
            "Nod **SK0MMR** i **Stockholm** gick igång på talk group **240**!!! \
             Denna station har inte sagt någonting på 1:02 minuter"
        );
    }

    #[test]
    fn missing_talk_group_renders_dash() {
        let msg = format_activation(&node(None), None, None);
        assert!(msg.contains("talk group **-**"));
    }

    #[tokio::test]
    async fn log_listener_never_fails() {
        let listener = LogListener;
        assert!(listener.on_activation(&node(Some(240)), None).await.is_ok());
        assert_eq!(listener.name(), "log");
    }
}
