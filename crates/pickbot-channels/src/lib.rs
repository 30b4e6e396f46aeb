//! Pickbot Channels — chat platform integrations.
//!
//! This crate provides:
//! - **base**: the `Channel` trait (lifecycle + sending) and the `ChatUsers`
//!   trait (user name lookups)
//! - **manager**: `ChannelManager` — lifecycle orchestration and outbound routing
//! - **slack** (feature `slack`): Socket Mode + Web API implementation

pub mod base;
pub mod manager;

#[cfg(feature = "slack")]
pub mod slack;

pub use base::{Channel, ChatUsers};
pub use manager::ChannelManager;
