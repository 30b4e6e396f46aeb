//! Pull request assignment for a picked member.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use pickbot_core::types::Member;
use pickbot_directory::DirectoryClient;
use pickbot_hosting::{parse_pull_requests, HostingClient};

/// Why a member could not be set as reviewer.
///
/// The messages end up verbatim in chat after "as pull-request reviewer: ".
#[derive(Error, Debug)]
pub enum AssignError {
    #[error("no github account for slack user <@{0}>")]
    NoHostingLogin(String),

    #[error("error fetching <@{handle}> from the directory. Please manually assign instead")]
    DirectoryLookup {
        handle: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no pull request links for the {0} organization found in the message")]
    NoPullRequests(String),

    #[error("every GitHub request failed, check my logs for details")]
    AllRequestsFailed,
}

/// What an assignment run did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssignmentReport {
    /// Extra chat lines to post before the confirmation (dev mode).
    pub notices: Vec<String>,
    /// Repos where the member became an assignee.
    pub assigned: Vec<String>,
    /// Repos where the member's review was requested.
    pub reviewing: Vec<String>,
}

pub struct Assigner {
    directory: Arc<dyn DirectoryClient>,
    hosting: Arc<dyn HostingClient>,
    org: String,
    dev_mode: bool,
}

impl Assigner {
    pub fn new(
        directory: Arc<dyn DirectoryClient>,
        hosting: Arc<dyn HostingClient>,
        org: impl Into<String>,
        dev_mode: bool,
    ) -> Self {
        Self {
            directory,
            hosting,
            org: org.into(),
            dev_mode,
        }
    }

    /// The member's hosting login, from the member itself or the directory.
    async fn hosting_login(&self, member: &Member) -> Result<String, AssignError> {
        if let Some(login) = &member.hosting_login {
            return Ok(login.clone());
        }

        let record = self
            .directory
            .user_by_handle(&member.handle)
            .await
            .map_err(|source| {
                error!(user = %member.handle, error = %source, "directory lookup for assignment failed");
                AssignError::DirectoryLookup {
                    handle: member.handle.clone(),
                    source,
                }
            })?;

        Member::from(&record).hosting_login.ok_or_else(|| {
            error!(user = %member.handle, email = %record.email, "no hosting login on directory record");
            AssignError::NoHostingLogin(member.handle.clone())
        })
    }

    /// Make `member` assignee and reviewer of every pull request linked in `text`.
    ///
    /// Both requests are attempted for every pull request; a failure is
    /// logged and the rest carry on. The run succeeds when at least one
    /// request went through.
    pub async fn assign_reviewer(&self, member: &Member, text: &str) -> Result<AssignmentReport, AssignError> {
        let login = self.hosting_login(member).await?;

        let prs = parse_pull_requests(&self.org, text);
        if prs.is_empty() {
            return Err(AssignError::NoPullRequests(self.org.clone()));
        }

        let mut report = AssignmentReport::default();
        let logins = [login.clone()];

        if self.dev_mode {
            for pr in &prs {
                debug!(login = %login, repo = %pr.repo, number = pr.number, "dev mode, skipping GitHub");
                report
                    .notices
                    .push(format!("would have assigned {} to {}", login, pr.repo));
            }
            return Ok(report);
        }

        for pr in &prs {
            match self
                .hosting
                .add_assignees(&pr.owner, &pr.repo, pr.number, &logins)
                .await
            {
                Ok(()) => report.assigned.push(pr.repo.clone()),
                Err(e) => warn!(repo = %pr.repo, number = pr.number, login = %login, error = %e, "failed to add assignee"),
            }
            match self
                .hosting
                .add_reviewers(&pr.owner, &pr.repo, pr.number, &logins)
                .await
            {
                Ok(()) => report.reviewing.push(pr.repo.clone()),
                Err(e) => warn!(repo = %pr.repo, number = pr.number, login = %login, error = %e, "failed to request review"),
            }
        }

        if report.assigned.is_empty() && report.reviewing.is_empty() {
            return Err(AssignError::AllRequestsFailed);
        }

        info!(
            login = %login,
            assigned = ?report.assigned,
            reviewing = ?report.reviewing,
            "pull request assignment done"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{record, FakeDirectory, FakeHosting};

    const TWO_PRS: &str = "assign infra https://github.com/acme/api/pull/1 <https://github.com/acme/web/pull/2|web>";

    fn assigner(directory: FakeDirectory, hosting: Arc<FakeHosting>, dev_mode: bool) -> Assigner {
        Assigner::new(Arc::new(directory), hosting, "acme", dev_mode)
    }

    fn octocat() -> Member {
        Member {
            hosting_login: Some("octocat".into()),
            ..Member::from_handle("U1")
        }
    }

    #[tokio::test]
    async fn test_assigns_every_pull_request() {
        let hosting = Arc::new(FakeHosting::default());
        let a = assigner(FakeDirectory::default(), hosting.clone(), false);

        let report = a.assign_reviewer(&octocat(), TWO_PRS).await.unwrap();
        assert_eq!(report.assigned, vec!["api", "web"]);
        assert_eq!(report.reviewing, vec!["api", "web"]);
        assert!(report.notices.is_empty());
        assert_eq!(
            hosting.calls(),
            vec![
                "assignees acme/api#1 octocat",
                "reviewers acme/api#1 octocat",
                "assignees acme/web#2 octocat",
                "reviewers acme/web#2 octocat",
            ]
        );
    }

    #[tokio::test]
    async fn test_partial_failure_still_succeeds() {
        let hosting = Arc::new(FakeHosting::failing(&["api"]));
        let a = assigner(FakeDirectory::default(), hosting.clone(), false);

        let report = a.assign_reviewer(&octocat(), TWO_PRS).await.unwrap();
        assert_eq!(report.assigned, vec!["web"]);
        assert_eq!(report.reviewing, vec!["web"]);
        assert_eq!(hosting.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_all_failures() {
        let hosting = Arc::new(FakeHosting::failing(&["api", "web"]));
        let a = assigner(FakeDirectory::default(), hosting, false);

        let err = a.assign_reviewer(&octocat(), TWO_PRS).await.unwrap_err();
        assert!(matches!(err, AssignError::AllRequestsFailed));
    }

    #[tokio::test]
    async fn test_dev_mode_only_describes() {
        let hosting = Arc::new(FakeHosting::default());
        let a = assigner(FakeDirectory::default(), hosting.clone(), true);

        let report = a.assign_reviewer(&octocat(), TWO_PRS).await.unwrap();
        assert_eq!(
            report.notices,
            vec!["would have assigned octocat to api", "would have assigned octocat to web"]
        );
        assert!(hosting.calls().is_empty());
    }

    #[tokio::test]
    async fn test_login_fetched_from_directory() {
        let hosting = Arc::new(FakeHosting::default());
        let directory = FakeDirectory::with_records(vec![record("U2", "Infra", "hubot")]);
        let a = assigner(directory, hosting.clone(), false);

        a.assign_reviewer(&Member::from_handle("U2"), "https://github.com/acme/api/pull/9")
            .await
            .unwrap();
        assert_eq!(hosting.calls()[0], "assignees acme/api#9 hubot");
    }

    #[tokio::test]
    async fn test_missing_login() {
        let directory = FakeDirectory::with_records(vec![record("U2", "Infra", "")]);
        let a = assigner(directory, Arc::new(FakeHosting::default()), false);

        let err = a
            .assign_reviewer(&Member::from_handle("U2"), TWO_PRS)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no github account for slack user <@U2>");
    }

    #[tokio::test]
    async fn test_directory_lookup_failure() {
        let a = assigner(FakeDirectory::default(), Arc::new(FakeHosting::default()), false);

        let err = a
            .assign_reviewer(&Member::from_handle("U404"), TWO_PRS)
            .await
            .unwrap_err();
        assert!(matches!(err, AssignError::DirectoryLookup { .. }));
        assert!(err.to_string().starts_with("error fetching <@U404> from the directory"));
    }

    #[tokio::test]
    async fn test_no_pull_requests() {
        let hosting = Arc::new(FakeHosting::default());
        let a = assigner(FakeDirectory::default(), hosting.clone(), false);

        let err = a
            .assign_reviewer(&octocat(), "assign infra https://github.com/other/api/pull/1")
            .await
            .unwrap_err();
        assert!(matches!(err, AssignError::NoPullRequests(_)));
        assert!(hosting.calls().is_empty());
    }
}
