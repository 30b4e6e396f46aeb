//! GitHub REST client for pull request assignment.
//!
//! Requests are serialized and spaced by a minimum interval; bursts of
//! concurrent writes trip GitHub's secondary rate limits.

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::traits::HostingClient;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// 5000 requests per hour ≈ one every 720 ms.
pub const DEFAULT_MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(720);

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

#[derive(Serialize)]
struct AssigneesBody<'a> {
    assignees: &'a [String],
}

#[derive(Serialize)]
struct ReviewersBody<'a> {
    reviewers: &'a [String],
}

// ─────────────────────────────────────────────
// GithubClient
// ─────────────────────────────────────────────

pub struct GithubClient {
    client: reqwest::Client,
    api_base: String,
    token: String,
    min_interval: Duration,
    /// Time of the last request; held across the wait to serialize callers.
    last_request: Mutex<Option<Instant>>,
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("api_base", &self.api_base)
            .field("min_interval", &self.min_interval)
            .finish()
    }
}

impl GithubClient {
    pub fn new(token: &str, api_base: Option<&str>, min_interval: Duration) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(USER_AGENT, HeaderValue::from_static("pickbot"));
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build GitHub HTTP client")?;

        Ok(GithubClient {
            client,
            api_base: api_base
                .unwrap_or(DEFAULT_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            token: token.to_string(),
            min_interval,
            last_request: Mutex::new(None),
        })
    }

    /// Wait until at least `min_interval` has passed since the previous request.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                debug!(wait_ms = (ready_at - now).as_millis() as u64, "pacing GitHub request");
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn post<B: Serialize + Sync>(&self, url: String, body: &B, what: &str) -> anyhow::Result<()> {
        self.pace().await;

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("GitHub {} request failed", what))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(status = %status, body = %error_text, url = %url, "GitHub {} failed", what);
            return Err(anyhow!("GitHub {} failed: {} — {}", what, status, error_text));
        }
        Ok(())
    }
}

#[async_trait]
impl HostingClient for GithubClient {
    async fn add_assignees(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        logins: &[String],
    ) -> anyhow::Result<()> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/assignees",
            self.api_base, owner, repo, number
        );
        self.post(url, &AssigneesBody { assignees: logins }, "add assignees")
            .await
    }

    async fn add_reviewers(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        logins: &[String],
    ) -> anyhow::Result<()> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/requested_reviewers",
            self.api_base, owner, repo, number
        );
        self.post(url, &ReviewersBody { reviewers: logins }, "request reviewers")
            .await
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
