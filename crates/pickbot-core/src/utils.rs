//! Utility helpers — data path and chat mention syntax.

use std::path::PathBuf;

/// Get the Pickbot data directory (e.g. `~/.pickbot/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".pickbot")
}

/// Slack mention syntax for a handle: `<@U123>`.
pub fn mention(handle: &str) -> String {
    format!("<@{}>", handle)
}

/// Parse a `<@U123>` (or `<@U123|name>`) mention at the start of `token`.
///
/// Returns the handle when it is made of ASCII letters, digits and `-` only.
pub fn parse_mention(token: &str) -> Option<&str> {
    let rest = token.strip_prefix("<@")?;
    let end = rest.find('>')?;
    let inner = &rest[..end];
    let handle = inner.split('|').next().unwrap_or(inner);
    let valid = !handle.is_empty()
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    valid.then_some(handle)
}

/// Helper to get home directory.
fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}
