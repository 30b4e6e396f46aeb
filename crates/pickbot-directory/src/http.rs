//! HTTP directory client.
//!
//! Endpoints, relative to the configured base URL:
//! - `GET  /list` → `[UserRecord]`
//! - `GET  /alias/slack/{handle}` → `UserRecord`
//! - `PUT  /upsert` (header `X-Upsert-Author`) → `UserRecord`

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, error};

use pickbot_core::types::UserRecord;

use crate::traits::DirectoryClient;

/// Header naming who performed an upsert.
const UPSERT_AUTHOR_HEADER: &str = "X-Upsert-Author";

// ─────────────────────────────────────────────
// HttpDirectory
// ─────────────────────────────────────────────

pub struct HttpDirectory {
    client: reqwest::Client,
    base: Url,
}

impl std::fmt::Debug for HttpDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDirectory")
            .field("base", &self.base.as_str())
            .finish()
    }
}

impl HttpDirectory {
    pub fn new(base_url: &str, timeout_s: u64) -> anyhow::Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("invalid directory url '{}'", base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("directory url '{}' cannot be used as a base", base_url);
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_s))
            .build()
            .context("failed to build directory HTTP client")?;

        Ok(HttpDirectory { client, base })
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("directory url cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Turn a non-2xx response into an error carrying status and body.
    async fn check(response: reqwest::Response, what: &str) -> anyhow::Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        error!(status = %status, body = %body, "directory {} failed", what);
        Err(anyhow!("directory {} failed: {} — {}", what, status, body))
    }
}

#[async_trait]
impl DirectoryClient for HttpDirectory {
    async fn get_user_list(&self) -> anyhow::Result<Vec<UserRecord>> {
        let url = self.endpoint(&["list"])?;
        debug!(url = %url, "fetching directory user list");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("directory list request failed")?;
        let response = Self::check(response, "list").await?;

        // Decode loosely first so one malformed entry reports its position.
        let raw: Vec<Value> = response
            .json()
            .await
            .context("directory list response was not a JSON array")?;
        let users = raw
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                serde_json::from_value::<UserRecord>(v)
                    .with_context(|| format!("invalid user record at index {}", i))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        debug!(users = users.len(), "directory user list received");
        Ok(users)
    }

    async fn user_by_handle(&self, handle: &str) -> anyhow::Result<UserRecord> {
        let url = self.endpoint(&["alias", "slack", handle])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("directory lookup for {} failed", handle))?;
        let response = Self::check(response, "lookup").await?;
        response
            .json::<UserRecord>()
            .await
            .with_context(|| format!("invalid directory record for {}", handle))
    }

    async fn upsert_user(
        &self,
        owner_tag: &str,
        record: &UserRecord,
    ) -> anyhow::Result<UserRecord> {
        let url = self.endpoint(&["upsert"])?;
        debug!(handle = %record.handle, owner = owner_tag, "upserting directory record");

        let response = self
            .client
            .put(url)
            .header(UPSERT_AUTHOR_HEADER, owner_tag)
            .json(record)
            .send()
            .await
            .with_context(|| format!("directory upsert for {} failed", record.handle))?;
        let response = Self::check(response, "upsert").await?;
        response
            .json::<UserRecord>()
            .await
            .context("invalid directory upsert response")
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
