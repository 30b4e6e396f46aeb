//! Channel traits — what every chat platform integration provides.
//!
//! - [`Channel`]: `start()` (long-running listener), `stop()`, `send()`
//! - [`ChatUsers`]: resolve a chat handle to the user's name, used to tell
//!   whether a leading mention addresses the bot

use async_trait::async_trait;
use pickbot_core::bus::types::OutboundMessage;

/// Every chat channel implements this trait.
///
/// The `ChannelManager` holds `Arc<dyn Channel>` and orchestrates
/// start/stop/send across all registered channels.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Unique channel name (e.g. "slack").
    ///
    /// Must match `OutboundMessage.channel`.
    fn name(&self) -> &str;

    /// Start listening for incoming messages and publish them to the bus.
    /// Runs until `stop()` is called.
    async fn start(&self) -> anyhow::Result<()>;

    async fn stop(&self) -> anyhow::Result<()>;

    /// Deliver an outbound message.
    async fn send(&self, msg: &OutboundMessage) -> anyhow::Result<()>;
}

/// User lookups on the chat platform.
#[async_trait]
pub trait ChatUsers: Send + Sync {
    /// The user name (not display name) behind a handle.
    async fn user_name(&self, handle: &str) -> anyhow::Result<String>;
}
