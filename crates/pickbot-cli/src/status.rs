//! `pickbot status` — show configuration and integration status.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use pickbot_core::config::{get_config_path, load_config};

use crate::helpers::configured_mark;

pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(get_config_path);

    println!();
    println!("{}", "Pickbot Status".cyan().bold());
    println!();

    println!(
        "  {:<14} {} {}",
        "Config:".bold(),
        path.display(),
        if path.exists() {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".red().to_string()
        }
    );
    println!("  {:<14} {}", "Bot name:".bold(), config.bot.name);
    println!(
        "  {:<14} {}",
        "Dev mode:".bold(),
        if config.bot.dev_mode { "on" } else { "off" }
    );
    let operators = if config.bot.operators.is_empty() {
        "everyone".to_string()
    } else {
        config.bot.operators.join(", ")
    };
    println!("  {:<14} {}", "Operators:".bold(), operators);

    println!();
    println!("  {}", "Integrations:".bold());
    println!(
        "    {:<12} {}",
        "Directory",
        configured_mark(config.directory.is_configured())
    );
    println!(
        "    {:<12} {}",
        "GitHub",
        configured_mark(config.github.is_configured())
    );
    println!(
        "    {:<12} {}",
        "Slack",
        configured_mark(config.slack.is_configured())
    );

    println!();
    println!("  {}", "Roster:".bold());
    println!("    {:<12} {}", "Group", config.roster.group_prefix);
    println!("    {:<12} every {}s", "Refresh", config.roster.refresh_interval_s);
    println!();

    Ok(())
}
