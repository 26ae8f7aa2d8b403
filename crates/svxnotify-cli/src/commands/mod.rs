pub mod config;
pub mod nodes;
pub mod role;
pub mod run;

use std::path::{Path, PathBuf};

use svxnotify_core::{Config, ConfigError};

/// Resolve the config file and load it, creating defaults on first use.
pub fn load_config(path: Option<&Path>) -> Result<(Config, PathBuf), ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()?,
    };
    let config = Config::load_from(&path)?;
    Ok((config, path))
}

/// Runtime for commands that talk to the network.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread().enable_all().build()
}
