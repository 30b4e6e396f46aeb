//! Configuration schema.
//!
//! Hierarchy: `Config` → `BotConfig`, `RosterConfig`, `DirectoryConfig`,
//! `GithubConfig`, `SlackConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.

use serde::{Deserialize, Serialize};

use crate::refresh::DEFAULT_REFRESH_INTERVAL_S;
use crate::roster::DEFAULT_MAX_DISTANCE;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.pickbot/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub bot: BotConfig,
    pub roster: RosterConfig,
    pub directory: DirectoryConfig,
    pub github: GithubConfig,
    pub slack: SlackConfig,
}

// ─────────────────────────────────────────────
// Bot
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotConfig {
    /// Chat user name the bot answers to.
    pub name: String,
    /// When set, assignments are described in chat instead of performed.
    pub dev_mode: bool,
    /// Handles allowed to force a roster refresh. Empty = everyone.
    pub operators: Vec<String>,
    /// Author recorded on directory upserts.
    pub owner_tag: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "pickbot".to_string(),
            dev_mode: true,
            operators: Vec::new(),
            owner_tag: "pickbot".to_string(),
        }
    }
}

impl BotConfig {
    pub fn is_operator(&self, handle: &str) -> bool {
        self.operators.is_empty() || self.operators.iter().any(|o| o == handle)
    }
}

// ─────────────────────────────────────────────
// Roster
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RosterConfig {
    /// Seconds between directory refreshes. 0 disables periodic refresh.
    pub refresh_interval_s: u64,
    /// Directory group label prefix that marks engineering teams.
    pub group_prefix: String,
    /// Exclusive edit-distance bound for fuzzy team matching.
    pub team_match_distance: usize,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            refresh_interval_s: DEFAULT_REFRESH_INTERVAL_S,
            group_prefix: "Engineering".to_string(),
            team_match_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

// ─────────────────────────────────────────────
// Directory
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectoryConfig {
    /// Base URL of the directory service API.
    pub url: String,
    pub timeout_s: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_s: 30,
        }
    }
}

impl DirectoryConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }
}

// ─────────────────────────────────────────────
// GitHub
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GithubConfig {
    /// Organization whose pull requests may be assigned.
    pub org: String,
    /// Static API token.
    pub token: String,
    pub api_base: String,
    /// Prefix of the organization's team slugs, used in reply links.
    pub team_slug_prefix: String,
    /// Minimum spacing between API calls.
    pub min_request_interval_ms: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            org: String::new(),
            token: String::new(),
            api_base: "https://api.github.com".to_string(),
            team_slug_prefix: "eng-".to_string(),
            min_request_interval_ms: 720,
        }
    }
}

impl GithubConfig {
    pub fn is_configured(&self) -> bool {
        !self.token.is_empty() && !self.org.is_empty()
    }
}

// ─────────────────────────────────────────────
// Slack
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlackConfig {
    /// Bot token (`xoxb-...`).
    pub bot_token: String,
    /// App-level token (`xapp-...`), required for Socket Mode.
    pub app_token: String,
    /// Allowed user IDs. Empty = allow everyone.
    pub allowed_users: Vec<String>,
}

impl SlackConfig {
    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.app_token.is_empty()
    }
}
