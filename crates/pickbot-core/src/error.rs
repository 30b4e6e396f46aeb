//! Domain errors raised by team resolution and picking.

use thiserror::Error;

/// Errors from the resolve → build → pick pipeline.
///
/// All of them are user-visible and non-retryable: the user has to rephrase
/// the command or fix the team's membership.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PickError {
    /// No known team is close enough to the requested name.
    #[error("no team with that name was found")]
    TeamNotFound,

    /// More than one known team is close enough to the requested name.
    #[error("multiple possible matches: {}", .0.join(", "))]
    AmbiguousTeam(Vec<String>),

    /// The candidate list was empty after de-duplication and omission.
    #[error("no users to choose from")]
    NoEligibleUsers,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_message_joins_candidates() {
        let err = PickError::AmbiguousTeam(vec!["infra".into(), "infra-ops".into()]);
        assert_eq!(err.to_string(), "multiple possible matches: infra, infra-ops");
    }

    #[test]
    fn test_no_users_message() {
        assert_eq!(PickError::NoEligibleUsers.to_string(), "no users to choose from");
    }
}
