//! Override ledger — ordered (member, team, include) directives layered on
//! top of the directory roster.
//!
//! At most one entry per (handle, team) is live. A new directive for an
//! existing pair replaces it: the old entry is removed in place and the new
//! one goes to the end, every other entry keeps its position.

use crate::types::{Member, Override};

/// Ordered list of live overrides.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverrideLedger {
    entries: Vec<Override>,
}

impl OverrideLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from a sequence of directives, applying them in order.
    pub fn from_overrides(overrides: impl IntoIterator<Item = Override>) -> Self {
        let mut ledger = Self::new();
        for o in overrides {
            ledger.apply(o.member, &o.team, o.include);
        }
        ledger
    }

    /// Insert a directive, replacing any live one for the same (handle, team).
    pub fn apply(&mut self, member: Member, team: &str, include: bool) {
        if let Some(idx) = self
            .entries
            .iter()
            .position(|o| o.targets(&member.handle, team))
        {
            self.entries.remove(idx);
        }
        self.entries.push(Override::new(member, team, include));
    }

    /// Live entries for one team, in ledger order.
    pub fn for_team<'a>(&'a self, team: &'a str) -> impl Iterator<Item = &'a Override> + 'a {
        self.entries.iter().filter(move |o| o.team == team)
    }

    /// Whether `handle` is force-excluded from `team`.
    pub fn excludes(&self, handle: &str, team: &str) -> bool {
        self.entries
            .iter()
            .any(|o| !o.include && o.targets(handle, team))
    }

    /// Every team name mentioned by at least one override.
    pub fn team_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|o| o.team.as_str())
    }

    pub fn entries(&self) -> &[Override] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
