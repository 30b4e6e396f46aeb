//! `pickbot init` — create `~/.pickbot/config.json` with defaults.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use pickbot_core::config::schema::Config;
use pickbot_core::config::{get_config_path, save_config};

pub fn run(config_path: Option<&Path>) -> Result<()> {
    println!();
    println!("{}", "Pickbot — Setup".cyan().bold());
    println!();

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    if write_default_config(&path)? {
        println!("  {} created config at {}", "✓".green(), path.display());
    } else {
        println!("  {} config already exists at {}", "✓".green(), path.display());
    }

    println!();
    println!("{}", "Next steps:".bold());
    println!("  1. Set directory.url, github.org and github.token");
    println!("  2. Set slack.botToken and slack.appToken (Socket Mode)");
    println!("  3. Run {}", "pickbot gateway".cyan());
    println!();
    Ok(())
}

/// Write defaults to `path` unless a file is already there. True when written.
fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))
        .with_context(|| format!("failed to write config to {}", path.display()))?;
    Ok(true)
}
