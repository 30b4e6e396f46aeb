//! Refresh service — periodically rebuilds the roster generation.
//!
//! The service itself knows nothing about the directory: it is handed a
//! callback that fetches, builds and swaps a generation and returns the
//! resulting team count. A failed tick keeps the previous generation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{error, info};

// ─────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────

/// Default interval: 30 minutes.
pub const DEFAULT_REFRESH_INTERVAL_S: u64 = 30 * 60;

// ─────────────────────────────────────────────
// Callback type
// ─────────────────────────────────────────────

/// Callback invoked on each refresh tick. Returns the new team count.
pub type OnRefreshFn = Arc<
    dyn Fn() -> Pin<Box<dyn Future<Output = anyhow::Result<usize>> + Send>> + Send + Sync,
>;

// ─────────────────────────────────────────────
// RefreshService
// ─────────────────────────────────────────────

pub struct RefreshService {
    on_refresh: OnRefreshFn,
    /// Seconds between refreshes; 0 disables the periodic loop.
    interval_s: u64,
    shutdown: Arc<Notify>,
}

impl RefreshService {
    pub fn new(on_refresh: OnRefreshFn, interval_s: Option<u64>) -> Self {
        Self {
            on_refresh,
            interval_s: interval_s.unwrap_or(DEFAULT_REFRESH_INTERVAL_S),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Run the refresh loop until `stop()` is called.
    pub async fn start(&self) -> anyhow::Result<()> {
        if self.interval_s == 0 {
            info!("periodic roster refresh disabled");
            self.shutdown.notified().await;
            return Ok(());
        }

        info!(interval_s = self.interval_s, "refresh service started");

        loop {
            let sleep_duration = std::time::Duration::from_secs(self.interval_s);

            tokio::select! {
                _ = tokio::time::sleep(sleep_duration) => {
                    self.tick().await;
                }
                _ = self.shutdown.notified() => {
                    info!("refresh service shutting down");
                    return Ok(());
                }
            }
        }
    }

    pub fn stop(&self) {
        info!("stopping refresh service");
        self.shutdown.notify_waiters();
    }

    async fn tick(&self) {
        match (self.on_refresh)().await {
            Ok(teams) => info!(teams, "roster refreshed"),
            Err(e) => error!(error = %e, "roster refresh failed, keeping previous generation"),
        }
    }
}
