use std::path::Path;

use svxnotify_core::{init_logging, DiscordWebhook, FeedClient, LogListener, Result, SvxNotifier};
use tracing::{error, info, warn};

use super::{load_config, runtime};

pub fn run(config_path: Option<&Path>) -> Result<()> {
    let (config, path) = load_config(config_path)?;
    let _guard = init_logging(&config.logging)?;
    info!(target: "main", "Loaded config from {}", path.display());

    let feed = FeedClient::new(&config.feed)?;
    let mut notifier = SvxNotifier::new(feed, config.notifier.clone());
    notifier.add_listener(LogListener);

    match &config.discord.webhook_url {
        Some(url) => {
            let webhook = DiscordWebhook::new(url.as_str(), config.discord.request_timeout())?
                .with_role(config.discord.role_id);
            webhook.validate()?;
            notifier.add_listener(webhook);
        }
        None => warn!(target: "main", "No Discord webhook configured, logging activations only"),
    }

    info!(target: "main", "Setting up SVXNotifier...");
    runtime()?.block_on(notifier.poll_periodically(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(target: "main", "Cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
        info!(target: "main", "Interrupted, shutting down");
    }));
    Ok(())
}
