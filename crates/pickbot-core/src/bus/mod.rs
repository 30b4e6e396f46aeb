//! Message bus — plumbing between chat channels and the bot loop.

pub mod queue;
pub mod types;

pub use queue::MessageBus;
pub use types::{InboundMessage, OutboundMessage};
