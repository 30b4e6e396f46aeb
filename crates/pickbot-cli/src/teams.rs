//! `pickbot teams` — fetch the roster once and print the effective teams.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use pickbot_core::config::load_config;
use pickbot_core::{ResolvedTeam, RosterGeneration, TeamState};
use pickbot_directory::DirectoryClient;

use crate::helpers;

pub async fn run(config_path: Option<&Path>, team: Option<&str>) -> Result<()> {
    let config = load_config(config_path);
    let directory = helpers::build_directory(&config)?;

    let records = directory
        .get_user_list()
        .await
        .context("failed to fetch the directory user list")?;
    let state = TeamState::new(config.roster.team_match_distance);
    state.replace_generation(RosterGeneration::from_records(
        &records,
        &config.roster.group_prefix,
    ));

    let teams = match team {
        Some(raw) => vec![state
            .resolve_and_build(raw)
            .with_context(|| format!("cannot resolve team {raw:?}"))?],
        None => state.teams(),
    };

    println!();
    for team in &teams {
        print!("{}", render_team(team));
    }
    let fetched_at = state
        .refreshed_at()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_default();
    println!(
        "{}",
        format!(
            "{} team(s) from {} directory record(s), fetched {}",
            teams.len(),
            records.len(),
            fetched_at
        )
        .dimmed()
    );
    Ok(())
}

/// One team as a header line followed by one "First Last (HANDLE)" per member.
fn render_team(team: &ResolvedTeam) -> String {
    let mut out = format!("{} ({} members)\n", team.name.bold(), team.members.len());
    for member in &team.members {
        out.push_str("  ");
        out.push_str(&member.describe());
        out.push('\n');
    }
    out.push('\n');
    out
}
