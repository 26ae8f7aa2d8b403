use std::path::Path;

use clap::Subcommand;
use svxnotify_core::{Config, CoreError, Result};

use super::load_config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Dot-separated key (e.g. "notifier.threshold_secs", "discord.role_id")
        key: String,
    },
    /// Set a config value
    Set {
        /// Dot-separated key
        key: String,
        /// New value ("none" clears optional settings)
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Print the config file location
    Path,
}

pub fn run(config_path: Option<&Path>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let (config, _) = load_config(config_path)?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let (mut config, path) = load_config(config_path)?;
            config.set(&key, &value)?;
            config.save_to(&path)?;
            println!("ok");
        }
        ConfigAction::List => {
            let (config, _) = load_config(config_path)?;
            let listing = toml::to_string_pretty(&config).map_err(|e| CoreError::Custom(e.to_string()))?;
            println!("{listing}");
        }
        ConfigAction::Reset => {
            let path = match config_path {
                Some(path) => path.to_path_buf(),
                None => Config::default_path()?,
            };
            Config::default().save_to(&path)?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => {
            let (_, path) = load_config(config_path)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
