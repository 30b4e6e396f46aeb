//! Directory client trait.

use async_trait::async_trait;
use pickbot_core::types::UserRecord;

/// Read/write access to the people directory.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Every user known to the directory.
    async fn get_user_list(&self) -> anyhow::Result<Vec<UserRecord>>;

    /// One user, looked up by chat handle.
    async fn user_by_handle(&self, handle: &str) -> anyhow::Result<UserRecord>;

    /// Create or replace a user, recording `owner_tag` as the author.
    async fn upsert_user(&self, owner_tag: &str, record: &UserRecord)
        -> anyhow::Result<UserRecord>;
}
