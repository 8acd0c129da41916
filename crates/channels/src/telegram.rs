//! Telegram channel adapter.
//!
//! Outbound: `sendMessage` over the Bot API with `reqwest`.
//! Inbound: the `Update` payload Telegram POSTs to the webhook, reduced to the
//! fields the relay reads.

use async_trait::async_trait;
use chatrelay_core::channel::MessageSender;
use chatrelay_core::error::ChannelError;
use chatrelay_core::message::{ConversationId, InboundMessage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Sends messages through the Telegram Bot API.
pub struct TelegramSender {
    api_url: String,
    bot_token: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for TelegramSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSender")
            .field("api_url", &self.api_url)
            .field("bot_token", &"[REDACTED]")
            .finish()
    }
}

impl TelegramSender {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            api_url: "https://api.telegram.org".into(),
            bot_token: bot_token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the sender at a different Bot API server (local bot API, tests).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build from the `[telegram]` config section. A bot token is required.
    pub fn from_config(config: &chatrelay_config::TelegramConfig) -> Result<Self, ChannelError> {
        let token = config
            .bot_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ChannelError::NotConfigured("telegram.bot_token is not set".into()))?;
        Ok(Self::new(token).with_api_url(&config.api_url))
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }
}

/// Numeric chat ids go out as integers, `@channel` names as strings.
fn chat_id_value(conversation_id: &ConversationId) -> serde_json::Value {
    match conversation_id.as_str().parse::<i64>() {
        Ok(id) => serde_json::json!(id),
        Err(_) => serde_json::json!(conversation_id.as_str()),
    }
}

#[derive(Debug, Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[async_trait]
impl MessageSender for TelegramSender {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, conversation_id: &ConversationId, text: &str) -> Result<(), ChannelError> {
        let body = serde_json::json!({
            "chat_id": chat_id_value(conversation_id),
            "text": text,
        });

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::Network(e.to_string()))?;

        let status = response.status();
        let reply: Option<ApiReply> = response.json().await.ok();

        match reply {
            Some(ApiReply { ok: true, .. }) if status.is_success() => {
                debug!(
                    conversation_id = %conversation_id,
                    content_len = text.len(),
                    "Telegram message sent"
                );
                Ok(())
            }
            other => {
                let reason = other
                    .and_then(|r| r.description)
                    .unwrap_or_else(|| format!("HTTP {status}"));
                warn!(conversation_id = %conversation_id, reason = %reason, "Telegram send failed");
                Err(ChannelError::DeliveryFailed {
                    channel: "telegram".into(),
                    reason,
                })
            }
        }
    }
}

// --- Inbound update types ---

/// A webhook update. Only message updates are acted on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,

    pub chat: Chat,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,

    /// Absent for stickers, photos, service messages, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl From<TelegramMessage> for InboundMessage {
    fn from(msg: TelegramMessage) -> Self {
        InboundMessage {
            conversation_id: ConversationId::from(msg.chat.id),
            text: msg.text,
        }
    }
}
