//! Config loader — reads `~/.pickbot/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.pickbot/config.json`
//! 3. Environment variables `PICKBOT_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the given or default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

fn env_string(name: &str, target: &mut String) {
    if let Ok(val) = std::env::var(name) {
        *target = val;
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, target: &mut T) {
    if let Ok(val) = std::env::var(name) {
        match val.parse::<T>() {
            Ok(v) => *target = v,
            Err(_) => warn!(var = name, value = %val, "ignoring unparseable env override"),
        }
    }
}

fn env_list(name: &str, target: &mut Vec<String>) {
    if let Ok(val) = std::env::var(name) {
        *target = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `PICKBOT_<SECTION>__<FIELD>` (double underscore as delimiter).
/// Lists are comma separated; booleans accept `true`/`1`.
fn apply_env_overrides(mut config: Config) -> Config {
    // Bot
    env_string("PICKBOT_BOT__NAME", &mut config.bot.name);
    if let Ok(val) = std::env::var("PICKBOT_BOT__DEV_MODE") {
        config.bot.dev_mode = val == "true" || val == "1";
    }
    env_list("PICKBOT_BOT__OPERATORS", &mut config.bot.operators);
    env_string("PICKBOT_BOT__OWNER_TAG", &mut config.bot.owner_tag);

    // Roster
    env_parse("PICKBOT_ROSTER__REFRESH_INTERVAL_S", &mut config.roster.refresh_interval_s);
    env_string("PICKBOT_ROSTER__GROUP_PREFIX", &mut config.roster.group_prefix);
    env_parse("PICKBOT_ROSTER__TEAM_MATCH_DISTANCE", &mut config.roster.team_match_distance);

    // Directory
    env_string("PICKBOT_DIRECTORY__URL", &mut config.directory.url);
    env_parse("PICKBOT_DIRECTORY__TIMEOUT_S", &mut config.directory.timeout_s);

    // GitHub
    env_string("PICKBOT_GITHUB__ORG", &mut config.github.org);
    env_string("PICKBOT_GITHUB__TOKEN", &mut config.github.token);
    env_string("PICKBOT_GITHUB__API_BASE", &mut config.github.api_base);
    env_string("PICKBOT_GITHUB__TEAM_SLUG_PREFIX", &mut config.github.team_slug_prefix);
    env_parse(
        "PICKBOT_GITHUB__MIN_REQUEST_INTERVAL_MS",
        &mut config.github.min_request_interval_ms,
    );

    // Slack
    env_string("PICKBOT_SLACK__BOT_TOKEN", &mut config.slack.bot_token);
    env_string("PICKBOT_SLACK__APP_TOKEN", &mut config.slack.app_token);
    env_list("PICKBOT_SLACK__ALLOWED_USERS", &mut config.slack.allowed_users);

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
