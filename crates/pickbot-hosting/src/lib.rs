//! Code-hosting layer for Pickbot.
//!
//! - [`traits::HostingClient`]: add assignees and reviewers to a pull request
//! - [`github::GithubClient`]: GitHub REST implementation with request pacing
//! - [`pr_links`]: pull request references found in chat text

pub mod github;
pub mod pr_links;
pub mod traits;

pub use github::GithubClient;
pub use pr_links::{parse_pull_requests, PullRequestRef};
pub use traits::HostingClient;
