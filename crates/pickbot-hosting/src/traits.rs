//! Hosting client trait.

use async_trait::async_trait;

/// The two pull-request mutations the bot performs.
#[async_trait]
pub trait HostingClient: Send + Sync {
    async fn add_assignees(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        logins: &[String],
    ) -> anyhow::Result<()>;

    async fn add_reviewers(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        logins: &[String],
    ) -> anyhow::Result<()>;
}
