//! Shared team state — the two lock domains read by commands and written by refresh.
//!
//! The team domain (roster + override ledger) and the flair domain are
//! guarded by separate mutexes and never held at the same time. No guard
//! outlives a method call, so callers can never hold one across an `.await`.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::PickError;
use crate::flair::FlairRegistry;
use crate::roster::{OverrideLedger, RosterGeneration, TeamBook, DEFAULT_MAX_DISTANCE};
use crate::types::Member;

/// A resolved team and its effective members, read under one lock.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedTeam {
    pub name: String,
    pub members: Vec<Member>,
}

pub struct TeamState {
    team: Mutex<TeamBook>,
    flair: Mutex<FlairRegistry>,
    refreshed_at: Mutex<Option<DateTime<Utc>>>,
    max_distance: usize,
}

impl Default for TeamState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DISTANCE)
    }
}

impl TeamState {
    /// Empty state; `max_distance` bounds fuzzy team matching (exclusive).
    pub fn new(max_distance: usize) -> Self {
        Self {
            team: Mutex::new(TeamBook::default()),
            flair: Mutex::new(FlairRegistry::new()),
            refreshed_at: Mutex::new(None),
            max_distance,
        }
    }

    /// State preloaded with one generation.
    pub fn with_generation(generation: RosterGeneration, max_distance: usize) -> Self {
        let state = Self::new(max_distance);
        state.replace_generation(generation);
        state
    }

    fn team_book(&self) -> MutexGuard<'_, TeamBook> {
        self.team.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn flair_registry(&self) -> MutexGuard<'_, FlairRegistry> {
        self.flair.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── team domain ──

    /// Resolve a user-supplied team name.
    pub fn resolve(&self, raw: &str) -> Result<String, PickError> {
        self.team_book().resolve(raw, self.max_distance)
    }

    /// Effective members of a canonical team.
    pub fn build(&self, team: &str) -> Vec<Member> {
        self.team_book().build(team)
    }

    /// Resolve then build without releasing the lock in between.
    pub fn resolve_and_build(&self, raw: &str) -> Result<ResolvedTeam, PickError> {
        let book = self.team_book();
        let name = book.resolve(raw, self.max_distance)?;
        let members = book.build(&name);
        Ok(ResolvedTeam { name, members })
    }

    /// Record a live override. Persistence is the caller's job.
    pub fn apply_override(&self, member: Member, team: &str, include: bool) {
        self.team_book().overrides.apply(member, team, include);
    }

    /// Snapshot of the live override ledger.
    pub fn overrides(&self) -> OverrideLedger {
        self.team_book().overrides.clone()
    }

    /// Every resolvable team name, sorted.
    pub fn team_names(&self) -> Vec<String> {
        self.team_book()
            .team_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Every team with its effective members, sorted by team name.
    pub fn teams(&self) -> Vec<ResolvedTeam> {
        let book = self.team_book();
        book.team_names()
            .into_iter()
            .map(|name| ResolvedTeam {
                name: name.to_string(),
                members: book.build(name),
            })
            .collect()
    }

    // ── flair domain ──

    pub fn flair(&self, handle: &str) -> String {
        self.flair_registry().get(handle)
    }

    pub fn set_flair(&self, handle: &str, flair: &str) {
        self.flair_registry().set(handle, flair);
    }

    pub fn clear_flair(&self, handle: &str) {
        self.flair_registry().clear(handle);
    }

    /// `<@handle>` plus the handle's flair, if any.
    pub fn display(&self, handle: &str) -> String {
        crate::flair::display_mention(handle, &self.flair(handle))
    }

    // ── refresh ──

    /// Swap in a new generation and return its team count.
    ///
    /// Roster and ledger change together under the team lock; flair is
    /// replaced afterwards in its own critical section.
    pub fn replace_generation(&self, generation: RosterGeneration) -> usize {
        let RosterGeneration {
            roster,
            overrides,
            flair,
            fetched_at,
        } = generation;

        let team_count = {
            let mut book = self.team_book();
            *book = TeamBook::new(roster, OverrideLedger::from_overrides(overrides));
            book.team_names().len()
        };

        *self.flair_registry() = FlairRegistry::from_map(flair);
        *self.refreshed_at.lock().unwrap_or_else(|e| e.into_inner()) = Some(fetched_at);

        info!(teams = team_count, fetched_at = %fetched_at, "roster generation replaced");
        team_count
    }

    /// When the current generation was fetched, if ever.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        *self.refreshed_at.lock().unwrap_or_else(|e| e.into_inner())
    }
}
