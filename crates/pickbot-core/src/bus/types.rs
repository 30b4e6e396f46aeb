//! Bus event types — messages flowing between channels and the bot loop.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// An inbound chat message.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    /// Channel name (e.g. "slack").
    pub channel: String,
    /// Sender handle within the channel.
    pub sender_id: String,
    /// Conversation identifier to reply into.
    pub chat_id: String,
    /// Raw message text, mentions included.
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Channel-specific metadata (e.g. `thread_ts`).
    pub metadata: HashMap<String, String>,
}

impl InboundMessage {
    pub fn new(
        channel: impl Into<String>,
        sender_id: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        InboundMessage {
            channel: channel.into(),
            sender_id: sender_id.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Start an outbound reply to the same channel and conversation.
    ///
    /// Thread metadata is carried over so the reply lands in the same thread.
    pub fn reply(&self, content: impl Into<String>) -> OutboundMessage {
        let mut out = OutboundMessage::new(self.channel.clone(), self.chat_id.clone(), content);
        if let Some(ts) = self.metadata.get("thread_ts") {
            out.metadata.insert("thread_ts".to_string(), ts.clone());
        }
        out
    }
}

/// An outbound message from the bot to a channel.
#[derive(Clone, Debug)]
pub struct OutboundMessage {
    /// Target channel name.
    pub channel: String,
    /// Target conversation identifier.
    pub chat_id: String,
    pub content: String,
    /// Optional message ID to reply to.
    pub reply_to: Option<String>,
    /// Channel-specific metadata.
    pub metadata: HashMap<String, String>,
}

impl OutboundMessage {
    pub fn new(
        channel: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        OutboundMessage {
            channel: channel.into(),
            chat_id: chat_id.into(),
            content: content.into(),
            reply_to: None,
            metadata: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_message_creation() {
        let msg = InboundMessage::new("slack", "U1", "C1", "<@UBOT> help");

        assert_eq!(msg.channel, "slack");
        assert_eq!(msg.sender_id, "U1");
        assert_eq!(msg.chat_id, "C1");
        assert_eq!(msg.content, "<@UBOT> help");
        assert!(msg.metadata.is_empty());
    }

    #[test]
    fn test_reply_targets_same_conversation() {
        let msg = InboundMessage::new("slack", "U1", "C1", "hi");
        let out = msg.reply("hello");
        assert_eq!(out.channel, "slack");
        assert_eq!(out.chat_id, "C1");
        assert_eq!(out.content, "hello");
        assert!(out.reply_to.is_none());
        assert!(out.metadata.is_empty());
    }

    #[test]
    fn test_reply_keeps_thread() {
        let mut msg = InboundMessage::new("slack", "U1", "C1", "hi");
        msg.metadata.insert("thread_ts".to_string(), "1700000000.0001".to_string());
        let out = msg.reply("hello");
        assert_eq!(out.metadata.get("thread_ts").unwrap(), "1700000000.0001");
    }
}
