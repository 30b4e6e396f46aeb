//! Roster model — directory snapshots, overrides, and effective team membership.
//!
//! - [`Roster`]: team name → members, as derived from the directory
//! - [`RosterGeneration`]: one complete refresh (roster + overrides + flair)
//! - [`TeamBook`]: roster + live override ledger; resolves names and builds teams

pub mod overrides;
pub mod resolver;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::PickError;
use crate::types::{Member, Override, UserRecord};

pub use overrides::OverrideLedger;
pub use resolver::{edit_distance, resolve_team, DEFAULT_MAX_DISTANCE};

/// Separator between the group and the team in a directory label.
const LABEL_SEPARATOR: &str = " - ";

// ─────────────────────────────────────────────
// Roster
// ─────────────────────────────────────────────

/// Upstream team membership for one cache generation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Roster {
    teams: BTreeMap<String, Vec<Member>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a member to a team, creating the team if needed.
    pub fn add_member(&mut self, team: impl Into<String>, member: Member) {
        self.teams.entry(team.into()).or_default().push(member);
    }

    /// Register a team with no members yet.
    pub fn add_team(&mut self, team: impl Into<String>) {
        self.teams.entry(team.into()).or_default();
    }

    /// Members of a team; empty when the team is unknown.
    pub fn members(&self, team: &str) -> &[Member] {
        self.teams.get(team).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Known team names, sorted.
    pub fn team_names(&self) -> impl Iterator<Item = &str> {
        self.teams.keys().map(String::as_str)
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<Member>)> for Roster {
    fn from_iter<T: IntoIterator<Item = (S, Vec<Member>)>>(iter: T) -> Self {
        let mut roster = Roster::new();
        for (team, members) in iter {
            let team = team.into();
            roster.add_team(team.clone());
            for m in members {
                roster.add_member(team.clone(), m);
            }
        }
        roster
    }
}

/// Derive a canonical team name from a directory group label.
///
/// `"Engineering - Team Name"` with prefix `"Engineering"` → `"team-name"`.
/// Returns `None` when the label belongs to another group or has no team part.
pub fn canonical_team_name(label: &str, group_prefix: &str) -> Option<String> {
    if !label.starts_with(group_prefix) {
        return None;
    }
    let (_, team) = label.split_once(LABEL_SEPARATOR)?;
    let team = team.trim();
    if team.is_empty() {
        return None;
    }
    Some(
        team.to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-"),
    )
}

// ─────────────────────────────────────────────
// RosterGeneration
// ─────────────────────────────────────────────

/// One complete snapshot taken from the directory.
#[derive(Clone, Debug)]
pub struct RosterGeneration {
    pub roster: Roster,
    pub overrides: Vec<Override>,
    pub flair: HashMap<String, String>,
    pub fetched_at: DateTime<Utc>,
}

impl RosterGeneration {
    /// Build a generation from the directory's full user list.
    ///
    /// Every record contributes its unexpired overrides and its flair. Only
    /// active records in `group_prefix` with a team part join the roster.
    pub fn from_records(records: &[UserRecord], group_prefix: &str) -> Self {
        Self::from_records_at(records, group_prefix, Utc::now())
    }

    fn from_records_at(records: &[UserRecord], group_prefix: &str, now: DateTime<Utc>) -> Self {
        let mut roster = Roster::new();
        let mut overrides = Vec::new();
        let mut flair = HashMap::new();

        for record in records {
            let member = Member::from(record);

            for directive in &record.profile.team_overrides {
                if !directive.is_live(now.timestamp()) {
                    debug!(handle = %record.handle, team = %directive.team, "override expired, skipping");
                    continue;
                }
                overrides.push(Override::new(
                    member.clone(),
                    directive.team.clone(),
                    directive.include,
                ));
            }

            if !record.profile.flair.is_empty() {
                flair.insert(record.handle.clone(), record.profile.flair.clone());
            }

            if !record.active {
                continue;
            }
            match canonical_team_name(&record.team, group_prefix) {
                Some(team) => roster.add_member(team, member),
                None => {
                    if record.team.starts_with(group_prefix) {
                        debug!(handle = %record.handle, label = %record.team, "group label has no team part, skipping");
                    }
                }
            }
        }

        RosterGeneration {
            roster,
            overrides,
            flair,
            fetched_at: now,
        }
    }
}

// ─────────────────────────────────────────────
// TeamBook
// ─────────────────────────────────────────────

/// The roster and the live override ledger, read and written together.
#[derive(Clone, Debug, Default)]
pub struct TeamBook {
    pub roster: Arc<Roster>,
    pub overrides: OverrideLedger,
}

impl TeamBook {
    pub fn new(roster: Roster, overrides: OverrideLedger) -> Self {
        Self {
            roster: Arc::new(roster),
            overrides,
        }
    }

    /// Roster teams plus every team that only exists through overrides.
    pub fn team_names(&self) -> BTreeSet<&str> {
        self.roster
            .team_names()
            .chain(self.overrides.team_names())
            .collect()
    }

    /// Resolve a user-supplied team name to a canonical one.
    pub fn resolve(&self, raw: &str, max_distance: usize) -> Result<String, PickError> {
        resolve_team(raw, self.team_names(), max_distance)
    }

    /// Effective, de-duplicated membership of a team.
    ///
    /// Roster members minus exclusions, then inclusions appended; the first
    /// occurrence of each handle wins.
    pub fn build(&self, team: &str) -> Vec<Member> {
        let kept = self
            .roster
            .members(team)
            .iter()
            .filter(|m| !self.overrides.excludes(&m.handle, team));
        let added = self
            .overrides
            .for_team(team)
            .filter(|o| o.include)
            .map(|o| &o.member);

        let mut seen = BTreeSet::new();
        kept.chain(added)
            .filter(|m| seen.insert(m.handle.as_str()))
            .cloned()
            .collect()
    }
}
