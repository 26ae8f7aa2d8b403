use std::path::Path;

use clap::Subcommand;
use svxnotify_core::{DiscordRoles, Result, RoleCommand, RoleError, RoleToggle};

use super::{load_config, runtime};

#[derive(Subcommand)]
pub enum RoleAction {
    /// Give a member the notification role
    On {
        /// Discord user id
        user_id: u64,
    },
    /// Take the notification role away from a member
    Off {
        /// Discord user id
        user_id: u64,
    },
}

pub fn run(config_path: Option<&Path>, action: RoleAction) -> Result<()> {
    let (config, _) = load_config(config_path)?;
    let role_id = config
        .discord
        .role_id
        .ok_or(RoleError::MissingSetting("discord.role_id"))?;
    let toggle = RoleToggle::new(DiscordRoles::from_config(&config.discord)?, role_id);

    let (user_id, command) = match action {
        RoleAction::On { user_id } => (user_id, RoleCommand::Add),
        RoleAction::Off { user_id } => (user_id, RoleCommand::Remove),
    };
    runtime()?.block_on(toggle.apply(user_id, command))?;
    println!("{}", command.reply());
    Ok(())
}
