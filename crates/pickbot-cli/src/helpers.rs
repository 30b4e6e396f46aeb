//! Shared CLI helpers — path expansion, client construction, banner.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;

use pickbot_channels::ChatUsers;
use pickbot_core::config::schema::Config;
use pickbot_directory::HttpDirectory;
use pickbot_hosting::GithubClient;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Directory client from config; the directory is mandatory.
pub fn build_directory(config: &Config) -> Result<Arc<HttpDirectory>> {
    let dir = &config.directory;
    if !dir.is_configured() {
        anyhow::bail!(
            "directory url is not configured (set directory.url or PICKBOT_DIRECTORY__URL)"
        );
    }
    let client = HttpDirectory::new(&dir.url, dir.timeout_s)
        .with_context(|| format!("invalid directory url: {}", dir.url))?;
    Ok(Arc::new(client))
}

pub fn build_hosting(config: &Config) -> Result<Arc<GithubClient>> {
    let gh = &config.github;
    let client = GithubClient::new(
        &gh.token,
        Some(&gh.api_base),
        Duration::from_millis(gh.min_request_interval_ms),
    )?;
    Ok(Arc::new(client))
}

/// Stand-in used when no chat platform is connected; every lookup fails.
pub struct NoChatPlatform;

#[async_trait]
impl ChatUsers for NoChatPlatform {
    async fn user_name(&self, handle: &str) -> Result<String> {
        anyhow::bail!("no chat platform connected to look up {handle}")
    }
}

/// Print the startup banner.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "Pickbot".cyan().bold(), version.dimmed());
    println!();
}

/// Green check or a dimmed "not configured".
pub fn configured_mark(configured: bool) -> String {
    if configured {
        format!("{} configured", "✓".green())
    } else {
        format!("{}", "· not configured".dimmed())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
