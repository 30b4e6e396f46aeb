//! Slack channel — Socket Mode WebSocket + Web API.
//!
//! - Socket Mode WebSocket with envelope ACKs and auto-reconnect
//! - Forwards `app_mention` events and direct messages, mention text intact
//! - Replies via `chat.postMessage`, in-thread when the request was threaded
//! - `users.info` lookups (cached) for [`ChatUsers`]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::{Mutex, Notify, RwLock};
use tracing::{debug, error, info, warn};

use pickbot_core::bus::queue::MessageBus;
use pickbot_core::bus::types::{InboundMessage, OutboundMessage};
use pickbot_core::config::schema::SlackConfig;

use crate::base::{Channel, ChatUsers};

// ─────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────

/// Slack Web API base URL.
const SLACK_API_BASE: &str = "https://slack.com/api";

/// Slack message length limit for `chat.postMessage`.
const SLACK_MAX_LEN: usize = 4000;

/// Reconnect backoff step (seconds).
const RECONNECT_DELAY_SECS: u64 = 5;

/// Maximum consecutive reconnect attempts before giving up.
const MAX_RECONNECT_ATTEMPTS: u32 = 10;

// ─────────────────────────────────────────────
// Socket Mode types
// ─────────────────────────────────────────────

/// Socket Mode envelope received from Slack.
#[derive(Debug, Clone, Deserialize)]
struct SocketEnvelope {
    /// Must be ACKed immediately.
    envelope_id: String,
    /// `"events_api"`, `"slash_commands"`, `"interactive"`.
    #[serde(rename = "type")]
    envelope_type: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Serialize)]
struct SocketAck {
    envelope_id: String,
}

type WsSender = futures_util::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    tokio_tungstenite::tungstenite::Message,
>;

// ─────────────────────────────────────────────
// SlackChannel
// ─────────────────────────────────────────────

pub struct SlackChannel {
    config: SlackConfig,
    bus: Arc<MessageBus>,
    shutdown: Arc<Notify>,
    http: reqwest::Client,
    api_base: String,
    /// Bot's own user ID (resolved via `auth.test`).
    bot_user_id: Arc<RwLock<Option<String>>>,
    /// Active WebSocket write half (for ACKs and pongs).
    ws_write: Arc<Mutex<Option<WsSender>>>,
    /// handle → user name
    user_names: RwLock<HashMap<String, String>>,
}

impl SlackChannel {
    pub fn new(config: SlackConfig, bus: Arc<MessageBus>) -> Self {
        Self::with_api_base(config, bus, SLACK_API_BASE)
    }

    /// Point the Web API calls somewhere other than slack.com.
    pub fn with_api_base(config: SlackConfig, bus: Arc<MessageBus>, api_base: &str) -> Self {
        Self {
            config,
            bus,
            shutdown: Arc::new(Notify::new()),
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_user_id: Arc::new(RwLock::new(None)),
            ws_write: Arc::new(Mutex::new(None)),
            user_names: RwLock::new(HashMap::new()),
        }
    }

    // ─────────────────────────────────────────
    // Web API helpers
    // ─────────────────────────────────────────

    /// Fail with Slack's `error` field unless the body says `ok: true`.
    fn check_ok(body: &Value, method: &str) -> anyhow::Result<()> {
        if body["ok"].as_bool() != Some(true) {
            let err = body["error"].as_str().unwrap_or("unknown");
            anyhow::bail!("{} failed: {}", method, err);
        }
        Ok(())
    }

    /// Call `apps.connections.open` to get a WebSocket URL for Socket Mode.
    async fn get_ws_url(&self) -> anyhow::Result<String> {
        let body: Value = self
            .http
            .post(format!("{}/apps.connections.open", self.api_base))
            .bearer_auth(&self.config.app_token)
            .send()
            .await?
            .json()
            .await?;
        Self::check_ok(&body, "apps.connections.open")?;

        let url = body["url"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("no url in apps.connections.open response"))?;
        Ok(url.to_string())
    }

    /// Call `auth.test` to resolve the bot's own user ID.
    async fn resolve_bot_id(&self) -> anyhow::Result<String> {
        let body: Value = self
            .http
            .post(format!("{}/auth.test", self.api_base))
            .bearer_auth(&self.config.bot_token)
            .send()
            .await?
            .json()
            .await?;
        Self::check_ok(&body, "auth.test")?;

        let user_id = body["user_id"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("no user_id in auth.test response"))?;
        Ok(user_id.to_string())
    }

    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> anyhow::Result<()> {
        let mut body = json!({
            "channel": channel,
            "text": text,
        });
        if let Some(ts) = thread_ts {
            body["thread_ts"] = json!(ts);
        }

        let resp_body: Value = self
            .http
            .post(format!("{}/chat.postMessage", self.api_base))
            .bearer_auth(&self.config.bot_token)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;
        Self::check_ok(&resp_body, "chat.postMessage")
    }

    /// Split a long message into chunks of at most `SLACK_MAX_LEN` bytes,
    /// preferring newline boundaries.
    fn split_message(text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut remaining = text;

        while remaining.len() > SLACK_MAX_LEN {
            let mut cut = SLACK_MAX_LEN;
            while !remaining.is_char_boundary(cut) {
                cut -= 1;
            }
            let split_at = remaining[..cut]
                .rfind('\n')
                .filter(|&i| i > 0)
                .unwrap_or(cut);

            chunks.push(remaining[..split_at].to_string());
            remaining = remaining[split_at..].trim_start_matches('\n');
        }

        if !remaining.is_empty() || chunks.is_empty() {
            chunks.push(remaining.to_string());
        }
        chunks
    }

    // ─────────────────────────────────────────
    // Event processing
    // ─────────────────────────────────────────

    fn is_allowed(&self, sender_id: &str) -> bool {
        self.config.allowed_users.is_empty()
            || self.config.allowed_users.iter().any(|u| u == sender_id)
    }

    /// Turn a Socket Mode envelope into a bus message, if it is one the bot
    /// should see.
    ///
    /// Channel messages arrive as `app_mention`; direct messages arrive as
    /// plain `message` events with `channel_type = "im"`. Everything else
    /// (edits, joins, bot posts, other channel chatter) is dropped.
    fn inbound_from_envelope(&self, envelope: &SocketEnvelope, bot_id: &str) -> Option<InboundMessage> {
        if envelope.envelope_type != "events_api" {
            debug!(envelope_type = %envelope.envelope_type, "ignoring non-events_api envelope");
            return None;
        }

        let event = &envelope.payload["event"];
        let event_type = event["type"].as_str().unwrap_or("");
        let channel_type = event["channel_type"].as_str().unwrap_or("channel");

        let wanted = match event_type {
            "app_mention" => true,
            "message" => channel_type == "im" && event.get("subtype").is_none(),
            _ => false,
        };
        if !wanted {
            debug!(event_type = %event_type, channel_type = %channel_type, "ignoring event");
            return None;
        }

        if event.get("bot_id").is_some() {
            debug!("ignoring message from a bot");
            return None;
        }

        let sender_id = event["user"].as_str().unwrap_or("");
        if sender_id.is_empty() || sender_id == bot_id {
            return None;
        }

        if !self.is_allowed(sender_id) {
            warn!(sender = %sender_id, "access denied by allowed_users");
            return None;
        }

        let text = event["text"].as_str().unwrap_or("").trim();
        if text.is_empty() {
            return None;
        }

        let chat_id = event["channel"].as_str().unwrap_or("");
        let mut inbound = InboundMessage::new("slack", sender_id, chat_id, text);
        inbound
            .metadata
            .insert("channel_type".to_string(), channel_type.to_string());
        if let Some(ts) = event["ts"].as_str() {
            inbound.metadata.insert("ts".to_string(), ts.to_string());
        }
        if let Some(thread_ts) = event["thread_ts"].as_str() {
            inbound
                .metadata
                .insert("thread_ts".to_string(), thread_ts.to_string());
        }
        Some(inbound)
    }

    async fn process_envelope(&self, envelope: SocketEnvelope) {
        let bot_id = self.bot_user_id.read().await.clone().unwrap_or_default();

        if let Some(inbound) = self.inbound_from_envelope(&envelope, &bot_id) {
            debug!(sender = %inbound.sender_id, chat = %inbound.chat_id, "slack message received");
            if let Err(e) = self.bus.publish_inbound(inbound).await {
                error!(error = %e, "failed to publish inbound message");
            }
        }
    }

    // ─────────────────────────────────────────
    // WebSocket loop
    // ─────────────────────────────────────────

    /// Connect, receive events, ACK envelopes; reconnect with backoff.
    async fn run_socket_loop(&self) -> anyhow::Result<()> {
        use futures_util::{SinkExt, StreamExt};
        use tokio_tungstenite::tungstenite::Message as WsMessage;

        let mut attempts: u32 = 0;

        loop {
            if attempts > 0 {
                let delay = Duration::from_secs(RECONNECT_DELAY_SECS * (attempts as u64).min(6));
                info!(
                    attempt = attempts,
                    delay_secs = delay.as_secs(),
                    "reconnecting to Slack Socket Mode..."
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = self.shutdown.notified() => {
                        info!("shutdown during reconnect backoff");
                        return Ok(());
                    }
                }
            }

            if attempts >= MAX_RECONNECT_ATTEMPTS {
                anyhow::bail!("exceeded max reconnect attempts ({})", MAX_RECONNECT_ATTEMPTS);
            }

            let ws_url = match self.get_ws_url().await {
                Ok(url) => url,
                Err(e) => {
                    error!(error = %e, "failed to get Socket Mode URL");
                    attempts += 1;
                    continue;
                }
            };

            let ws_stream = match tokio_tungstenite::connect_async(ws_url.as_str()).await {
                Ok((stream, _)) => {
                    info!("connected to Slack Socket Mode");
                    attempts = 0;
                    stream
                }
                Err(e) => {
                    error!(error = %e, "WebSocket connect failed");
                    attempts += 1;
                    continue;
                }
            };

            let (write, mut read) = ws_stream.split();
            *self.ws_write.lock().await = Some(write);

            loop {
                tokio::select! {
                    msg = read.next() => {
                        match msg {
                            Some(Ok(WsMessage::Text(text))) => {
                                self.handle_ws_message(&text).await;
                            }
                            Some(Ok(WsMessage::Ping(data))) => {
                                let mut guard = self.ws_write.lock().await;
                                if let Some(ref mut w) = *guard {
                                    let _ = w.send(WsMessage::Pong(data)).await;
                                }
                            }
                            Some(Ok(WsMessage::Close(_))) => {
                                info!("Slack WebSocket closed by server");
                                break;
                            }
                            Some(Err(e)) => {
                                warn!(error = %e, "Slack WebSocket error");
                                break;
                            }
                            None => {
                                info!("Slack WebSocket stream ended");
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = self.shutdown.notified() => {
                        info!("shutdown signal received");
                        let mut guard = self.ws_write.lock().await;
                        if let Some(ref mut w) = *guard {
                            let _ = w.close().await;
                        }
                        *guard = None;
                        return Ok(());
                    }
                }
            }

            *self.ws_write.lock().await = None;
            attempts += 1;
        }
    }

    async fn handle_ws_message(&self, text: &str) {
        use futures_util::SinkExt;
        use tokio_tungstenite::tungstenite::Message as WsMessage;

        if let Ok(msg) = serde_json::from_str::<Value>(text) {
            match msg["type"].as_str() {
                Some("hello") => {
                    info!("received Socket Mode hello");
                    return;
                }
                Some("disconnect") => {
                    let reason = msg["reason"].as_str().unwrap_or("unknown");
                    info!(reason = %reason, "Slack requested disconnect");
                    return;
                }
                _ => {}
            }
        }

        let envelope: SocketEnvelope = match serde_json::from_str(text) {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "failed to parse Socket Mode envelope");
                return;
            }
        };

        // ACK before processing; Slack redelivers after 3 seconds.
        let ack = SocketAck {
            envelope_id: envelope.envelope_id.clone(),
        };
        if let Ok(ack_json) = serde_json::to_string(&ack) {
            let mut guard = self.ws_write.lock().await;
            if let Some(ref mut w) = *guard {
                if let Err(e) = w.send(WsMessage::Text(ack_json.into())).await {
                    warn!(error = %e, "failed to send ACK");
                }
            }
        }

        self.process_envelope(envelope).await;
    }
}

// ─────────────────────────────────────────────
// Trait implementations
// ─────────────────────────────────────────────

#[async_trait]
impl Channel for SlackChannel {
    fn name(&self) -> &str {
        "slack"
    }

    async fn start(&self) -> anyhow::Result<()> {
        if self.config.bot_token.is_empty() {
            warn!("slack bot_token is empty, channel will not start");
            return Ok(());
        }
        if self.config.app_token.is_empty() {
            warn!("slack app_token is empty (required for Socket Mode), channel will not start");
            return Ok(());
        }

        match self.resolve_bot_id().await {
            Ok(id) => {
                info!(bot_user_id = %id, "resolved Slack bot user ID");
                *self.bot_user_id.write().await = Some(id);
            }
            Err(e) => warn!(error = %e, "could not resolve bot user ID"),
        }

        info!("starting Slack Socket Mode channel");
        self.run_socket_loop().await
    }

    async fn stop(&self) -> anyhow::Result<()> {
        use futures_util::SinkExt;

        info!("stopping Slack channel");
        self.shutdown.notify_waiters();

        let mut guard = self.ws_write.lock().await;
        if let Some(ref mut w) = *guard {
            let _ = w.close().await;
        }
        *guard = None;
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> anyhow::Result<()> {
        let thread_ts = msg.metadata.get("thread_ts").map(String::as_str);

        for chunk in Self::split_message(&msg.content) {
            if let Err(e) = self.post_message(&msg.chat_id, &chunk, thread_ts).await {
                error!(error = %e, "failed to send Slack message");
                return Err(e);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChatUsers for SlackChannel {
    async fn user_name(&self, handle: &str) -> anyhow::Result<String> {
        if let Some(name) = self.user_names.read().await.get(handle) {
            return Ok(name.clone());
        }

        let body: Value = self
            .http
            .get(format!("{}/users.info", self.api_base))
            .bearer_auth(&self.config.bot_token)
            .query(&[("user", handle)])
            .send()
            .await?
            .json()
            .await?;
        Self::check_ok(&body, "users.info")?;

        let name = body["user"]["name"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("no user.name in users.info response"))?
            .to_string();

        self.user_names
            .write()
            .await
            .insert(handle.to_string(), name.clone());
        Ok(name)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
