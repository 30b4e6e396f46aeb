//! In-memory fakes for the bot's collaborators.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use pickbot_channels::ChatUsers;
use pickbot_core::types::UserRecord;
use pickbot_core::RandomSource;
use pickbot_directory::DirectoryClient;
use pickbot_hosting::HostingClient;

/// A directory record in the "Engineering - {team}" group.
pub fn record(handle: &str, team: &str, login: &str) -> UserRecord {
    UserRecord {
        handle: handle.into(),
        hosting_login: login.into(),
        first_name: format!("First{handle}"),
        last_name: format!("Last{handle}"),
        email: format!("{}@example.com", handle.to_lowercase()),
        active: true,
        team: format!("Engineering - {team}"),
        ..Default::default()
    }
}

// ── directory ──

#[derive(Default)]
pub struct FakeDirectory {
    pub records: Mutex<Vec<UserRecord>>,
    pub upserts: Mutex<Vec<(String, UserRecord)>>,
    pub fail_list: AtomicBool,
    pub fail_upsert: AtomicBool,
}

impl FakeDirectory {
    pub fn with_records(records: Vec<UserRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn upserts(&self) -> Vec<(String, UserRecord)> {
        self.upserts.lock().unwrap().clone()
    }
}

#[async_trait]
impl DirectoryClient for FakeDirectory {
    async fn get_user_list(&self) -> anyhow::Result<Vec<UserRecord>> {
        if self.fail_list.load(Ordering::SeqCst) {
            anyhow::bail!("directory unavailable");
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn user_by_handle(&self, handle: &str) -> anyhow::Result<UserRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.handle == handle)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("404 Not Found: no user {handle}"))
    }

    async fn upsert_user(&self, owner_tag: &str, record: &UserRecord) -> anyhow::Result<UserRecord> {
        if self.fail_upsert.load(Ordering::SeqCst) {
            anyhow::bail!("upsert rejected");
        }
        self.upserts
            .lock()
            .unwrap()
            .push((owner_tag.to_string(), record.clone()));

        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.handle == record.handle) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        Ok(record.clone())
    }
}

// ── hosting ──

/// Records every call as `"assignees acme/api#1 octocat"`; repos listed in
/// `failing` reject both kinds of request.
#[derive(Default)]
pub struct FakeHosting {
    pub calls: Mutex<Vec<String>>,
    pub failing: Vec<String>,
}

impl FakeHosting {
    pub fn failing(repos: &[&str]) -> Self {
        Self {
            failing: repos.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record_call(&self, kind: &str, owner: &str, repo: &str, number: u64, logins: &[String]) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{kind} {owner}/{repo}#{number} {}", logins.join(",")));
        if self.failing.iter().any(|r| r == repo) {
            anyhow::bail!("422 Unprocessable Entity");
        }
        Ok(())
    }
}

#[async_trait]
impl HostingClient for FakeHosting {
    async fn add_assignees(&self, owner: &str, repo: &str, number: u64, logins: &[String]) -> anyhow::Result<()> {
        self.record_call("assignees", owner, repo, number, logins)
    }

    async fn add_reviewers(&self, owner: &str, repo: &str, number: u64, logins: &[String]) -> anyhow::Result<()> {
        self.record_call("reviewers", owner, repo, number, logins)
    }
}

// ── chat users ──

pub struct FakeUsers(pub HashMap<String, String>);

impl FakeUsers {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(h, n)| (h.to_string(), n.to_string()))
                .collect(),
        )
    }
}

#[async_trait]
impl ChatUsers for FakeUsers {
    async fn user_name(&self, handle: &str) -> anyhow::Result<String> {
        self.0
            .get(handle)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("user_not_found"))
    }
}

// ── randomness ──

/// Replays a fixed list of indices, then keeps returning 0.
pub struct Scripted(pub VecDeque<usize>);

impl Scripted {
    pub fn new(indices: &[usize]) -> Self {
        Self(indices.iter().copied().collect())
    }
}

impl RandomSource for Scripted {
    fn next_index(&mut self, upper: usize) -> usize {
        self.0.pop_front().unwrap_or(0) % upper
    }
}
