//! Pull request references in free chat text.
//!
//! Matches `github.com/{org}/{repo}/pull/{number}` anywhere in a message,
//! with or without a scheme, bare or inside Slack's `<url|label>` wrapper.

use std::sync::LazyLock;

use regex::Regex;

/// Everything after `github.com/` up to whitespace or a Slack link delimiter.
static GITHUB_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"github\.com/([^\s<>|]+)").expect("valid github path pattern"));

/// One pull request found in a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

/// Every pull request of `org` referenced in `text`, in text order.
///
/// The owner segment must equal `org` exactly, the third segment must be
/// `pull` and the fourth must start with a number; anything after the
/// digits is ignored, so sentence punctuation does not hide a link.
pub fn parse_pull_requests(org: &str, text: &str) -> Vec<PullRequestRef> {
    if org.is_empty() {
        return Vec::new();
    }

    GITHUB_PATH
        .captures_iter(text)
        .filter_map(|caps| {
            let path = caps.get(1)?.as_str();
            let mut parts = path.split('/');
            let owner = parts.next()?;
            let repo = parts.next()?;
            let action = parts.next()?;
            let number = parts.next()?;

            if owner != org || repo.is_empty() || action != "pull" {
                return None;
            }
            // "123#discussion_r1", "123?w=1" and "123." all name PR 123.
            let digits = number
                .split(|c: char| !c.is_ascii_digit())
                .next()
                .filter(|d| !d.is_empty())?;
            let number = digits.parse::<u64>().ok()?;

            Some(PullRequestRef {
                owner: owner.to_string(),
                repo: repo.to_string(),
                number,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(repo: &str, number: u64) -> PullRequestRef {
        PullRequestRef {
            owner: "acme".into(),
            repo: repo.into(),
            number,
        }
    }

    #[test]
    fn test_single_link() {
        assert_eq!(
            parse_pull_requests("acme", "please look at https://github.com/acme/api/pull/42"),
            vec![pr("api", 42)]
        );
    }

    #[test]
    fn test_multiple_links_in_order() {
        let text = "github.com/acme/web/pull/7 and <https://github.com/acme/api/pull/3|the api one>";
        assert_eq!(parse_pull_requests("acme", text), vec![pr("web", 7), pr("api", 3)]);
    }

    #[test]
    fn test_trailing_segments_ignored() {
        let text = "https://github.com/acme/api/pull/42/files and https://github.com/acme/api/pull/43#discussion_r1";
        assert_eq!(parse_pull_requests("acme", text), vec![pr("api", 42), pr("api", 43)]);
    }

    #[test]
    fn test_trailing_punctuation() {
        assert_eq!(
            parse_pull_requests("acme", "please review https://github.com/acme/api/pull/42."),
            vec![pr("api", 42)]
        );
        assert_eq!(
            parse_pull_requests("acme", "(see https://github.com/acme/api/pull/43)"),
            vec![pr("api", 43)]
        );
        assert_eq!(
            parse_pull_requests("acme", "https://github.com/acme/web/pull/44, thanks"),
            vec![pr("web", 44)]
        );
    }

    #[test]
    fn test_other_org_ignored() {
        let text = "https://github.com/other/api/pull/1 https://github.com/acme-labs/api/pull/2";
        assert!(parse_pull_requests("acme", text).is_empty());
    }

    #[test]
    fn test_non_pull_links_ignored() {
        let text = "https://github.com/acme/api/issues/5 https://github.com/acme/api https://github.com/acme/api/pull/";
        assert!(parse_pull_requests("acme", text).is_empty());
    }

    #[test]
    fn test_bad_number_ignored() {
        assert!(parse_pull_requests("acme", "https://github.com/acme/api/pull/abc").is_empty());
        assert!(parse_pull_requests("acme", "https://github.com/acme/api/pull/-3").is_empty());
    }

    #[test]
    fn test_no_org_configured() {
        assert!(parse_pull_requests("", "https://github.com/acme/api/pull/1").is_empty());
    }
}
