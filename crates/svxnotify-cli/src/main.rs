use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "svxnotify", version, about = "SVX reflector activity notifier")]
struct Cli {
    /// Config file (defaults to ~/.config/svxnotify/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the reflector and announce activity until interrupted
    Run,
    /// Show the nodes currently reported by the reflector
    Nodes {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Include nodes flagged as hidden
        #[arg(long)]
        all: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Grant or revoke the notification role for a member
    Role {
        #[command(subcommand)]
        action: commands::role::RoleAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Run => commands::run::run(config_path),
        Commands::Nodes { json, all } => commands::nodes::run(config_path, json, all),
        Commands::Config { action } => commands::config::run(config_path, action),
        Commands::Role { action } => commands::role::run(config_path, action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
