//! Core types — members, team overrides, and the directory's user records.
//!
//! `UserRecord` mirrors the directory service's JSON; `Member` is the
//! trimmed-down, handle-keyed view the roster and picker work with.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::hash::{Hash, Hasher};

// ─────────────────────────────────────────────
// Member
// ─────────────────────────────────────────────

/// A person who can be picked.
///
/// Identity is the chat handle alone: two members with the same handle are
/// equal even if one of them carries more directory metadata.
#[derive(Clone, Debug, Default)]
pub struct Member {
    /// Stable chat-platform user id (e.g. Slack `U024BE7LH`).
    pub handle: String,
    /// Login on the code-hosting platform, when known.
    pub hosting_login: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Member {
    /// A member known only by handle (e.g. added through a chat override).
    pub fn from_handle(handle: impl Into<String>) -> Self {
        Member {
            handle: handle.into(),
            ..Default::default()
        }
    }

    /// `<@handle>` mention syntax.
    pub fn mention(&self) -> String {
        crate::utils::mention(&self.handle)
    }

    /// "First Last (HANDLE)" for operator-facing listings.
    pub fn describe(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.handle.clone()
        } else {
            format!("{} ({})", name, self.handle)
        }
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for Member {}

impl Hash for Member {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl From<&UserRecord> for Member {
    fn from(record: &UserRecord) -> Self {
        let login = record.hosting_login.trim();
        Member {
            handle: record.handle.clone(),
            hosting_login: (!login.is_empty()).then(|| login.to_string()),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
        }
    }
}

// ─────────────────────────────────────────────
// Override
// ─────────────────────────────────────────────

/// A manual membership directive for one (member, team) pair.
///
/// `include = true` forces the member into the team, `false` forces them out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Override {
    pub member: Member,
    pub team: String,
    pub include: bool,
}

impl Override {
    pub fn new(member: Member, team: impl Into<String>, include: bool) -> Self {
        Override {
            member,
            team: team.into(),
            include,
        }
    }

    /// Whether this entry targets the given (handle, team) pair.
    pub fn targets(&self, handle: &str, team: &str) -> bool {
        self.member.handle == handle && self.team == team
    }
}

// ─────────────────────────────────────────────
// Directory records
// ─────────────────────────────────────────────

/// A user as stored by the directory service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRecord {
    /// Chat handle.
    #[serde(rename = "slack_id")]
    pub handle: String,
    /// Code-hosting login; empty when the user never linked an account.
    #[serde(rename = "github")]
    pub hosting_login: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub active: bool,
    /// Free-text group label, e.g. `"Engineering - Team Name"`.
    pub team: String,
    /// Bot-owned section of the user's profile.
    #[serde(rename = "pickbot")]
    pub profile: BotProfile,
    /// Fields owned by other tools, written back untouched on upsert.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The bot's own profile section on a directory user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotProfile {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub flair: String,
    pub team_overrides: Vec<ProfileOverride>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A persisted override directive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOverride {
    pub team: String,
    pub include: bool,
    /// Unix seconds after which the directive lapses; 0 means never.
    pub until: i64,
}

impl ProfileOverride {
    /// Whether the directive still applies at `now` (unix seconds).
    pub fn is_live(&self, now: i64) -> bool {
        self.until <= 0 || now < self.until
    }
}

impl BotProfile {
    /// Record a directive for `team`, replacing any earlier one for the same team.
    pub fn set_override(&mut self, team: &str, include: bool) {
        if let Some(idx) = self.team_overrides.iter().rposition(|o| o.team == team) {
            self.team_overrides.remove(idx);
        }
        self.team_overrides.push(ProfileOverride {
            team: team.to_string(),
            include,
            until: 0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_equality_is_by_handle() {
        let a = Member {
            handle: "U1".into(),
            hosting_login: Some("octo".into()),
            first_name: "Ada".into(),
            ..Default::default()
        };
        let b = Member::from_handle("U1");
        assert_eq!(a, b);
        assert_ne!(a, Member::from_handle("U2"));
    }

    #[test]
    fn test_member_from_record_drops_empty_login() {
        let record = UserRecord {
            handle: "U1".into(),
            hosting_login: "  ".into(),
            ..Default::default()
        };
        assert_eq!(Member::from(&record).hosting_login, None);

        let record = UserRecord {
            handle: "U2".into(),
            hosting_login: "octocat".into(),
            ..Default::default()
        };
        assert_eq!(Member::from(&record).hosting_login.as_deref(), Some("octocat"));
    }

    #[test]
    fn test_describe() {
        let m = Member {
            handle: "U1".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            ..Default::default()
        };
        assert_eq!(m.describe(), "Ada Lovelace (U1)");
        assert_eq!(Member::from_handle("U9").describe(), "U9");
    }

    #[test]
    fn test_profile_set_override_replaces_same_team() {
        let mut profile = BotProfile::default();
        profile.set_override("infra", true);
        profile.set_override("web", false);
        profile.set_override("infra", false);

        let teams: Vec<(&str, bool)> = profile
            .team_overrides
            .iter()
            .map(|o| (o.team.as_str(), o.include))
            .collect();
        assert_eq!(teams, vec![("web", false), ("infra", false)]);
    }

    #[test]
    fn test_user_record_json_shape() {
        let json = r#"{
            "slack_id": "U1",
            "github": "octocat",
            "first_name": "Ada",
            "active": true,
            "team": "Engineering - Infra",
            "pickbot": {
                "flair": ":crab:",
                "team_overrides": [{"team": "web", "include": true}]
            }
        }"#;
        let record: UserRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.handle, "U1");
        assert_eq!(record.hosting_login, "octocat");
        assert!(record.active);
        assert_eq!(record.profile.flair, ":crab:");
        assert_eq!(record.profile.team_overrides[0].team, "web");
        assert_eq!(record.profile.team_overrides[0].until, 0);
    }

    #[test]
    fn test_user_record_keeps_unknown_fields() {
        let json = r#"{
            "slack_id": "U1",
            "github": "octo",
            "phone": "555-0100",
            "aws": "ada",
            "pickbot": {"flair": ":crab:", "theme": "dark"}
        }"#;
        let mut record: UserRecord = serde_json::from_str(json).unwrap();
        record.profile.set_override("infra", true);

        let written = serde_json::to_value(&record).unwrap();
        assert_eq!(written["phone"], "555-0100");
        assert_eq!(written["aws"], "ada");
        assert_eq!(written["pickbot"]["theme"], "dark");
        assert_eq!(written["pickbot"]["team_overrides"][0]["team"], "infra");
        assert!(written.get("extra").is_none());
    }

    #[test]
    fn test_profile_override_expiry() {
        let open = ProfileOverride { team: "web".into(), include: true, until: 0 };
        assert!(open.is_live(i64::MAX));

        let timed = ProfileOverride { team: "web".into(), include: true, until: 100 };
        assert!(timed.is_live(99));
        assert!(!timed.is_live(100));
    }
}
