//! Team name resolution — exact match first, then a tight edit-distance match.
//!
//! People type team names from memory ("eng-infra", "infra", "infar"). With
//! the default threshold only candidates at distance 1 are accepted.

use std::collections::BTreeSet;

use crate::error::PickError;

/// Default upper bound (exclusive) on the edit distance of a fuzzy match.
pub const DEFAULT_MAX_DISTANCE: usize = 2;

/// Decoration users put in front of team names.
const TEAM_PREFIX: &str = "eng-";

/// Resolve a user-supplied team name against the known team universe.
///
/// `universe` may contain duplicates; `max_distance` is exclusive.
pub fn resolve_team<'a, I>(raw: &str, universe: I, max_distance: usize) -> Result<String, PickError>
where
    I: IntoIterator<Item = &'a str>,
{
    let name = raw.strip_prefix(TEAM_PREFIX).unwrap_or(raw);
    let known: BTreeSet<&str> = universe.into_iter().collect();

    if known.contains(name) {
        return Ok(name.to_string());
    }

    let mut candidates: Vec<String> = known
        .iter()
        .filter(|team| edit_distance(name, team) < max_distance)
        .map(|team| team.to_string())
        .collect();

    match candidates.len() {
        0 => Err(PickError::TeamNotFound),
        1 => Ok(candidates.remove(0)),
        _ => Err(PickError::AmbiguousTeam(candidates)),
    }
}

/// Levenshtein distance with unit insert/delete/substitute costs.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two-row dynamic programming table.
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
