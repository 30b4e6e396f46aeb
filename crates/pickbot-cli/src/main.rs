//! Pickbot CLI — entry point.
//!
//! # Commands
//!
//! - `pickbot gateway` — run the bot against Slack, the directory and GitHub
//! - `pickbot teams [--team NAME]` — print the effective team roster
//! - `pickbot status` — show configuration and integration status
//! - `pickbot init` — write a default config file

mod gateway;
mod helpers;
mod init;
mod status;
mod teams;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Pickbot — picks reviewers from your engineering teams
#[derive(Parser)]
#[command(name = "pickbot", version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.pickbot/config.json)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway (Slack channel + bot loop + roster refresh)
    Gateway {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,

        /// Emit logs as JSON lines
        #[arg(long, default_value_t = false)]
        json_logs: bool,
    },

    /// Fetch the roster once and print every team's members
    Teams {
        /// Only print this team (fuzzy matched)
        #[arg(short, long)]
        team: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and integration status
    Status,

    /// Write a default configuration file
    Init,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path: Option<PathBuf> = cli.config.as_deref().map(helpers::expand_tilde);

    match cli.command {
        Commands::Gateway { logs, json_logs } => {
            init_logging(logs, json_logs);
            gateway::run(config_path.as_deref()).await
        }
        Commands::Teams { team, logs } => {
            init_logging(logs, false);
            teams::run(config_path.as_deref(), team.as_deref()).await
        }
        Commands::Status => status::run(config_path.as_deref()),
        Commands::Init => init::run(config_path.as_deref()),
    }
}

/// Initialize tracing/logging. `RUST_LOG` wins over the flags.
fn init_logging(verbose: bool, json: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose { "pickbot=debug,info" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}
