//! HTTP client for the external link-summarization queue.
//!
//! The queue accepts `{"url": ..., "chat_id": ...}` and replies into the chat
//! by itself once the summary is ready.

use async_trait::async_trait;
use chatrelay_core::error::ChannelError;
use chatrelay_core::message::ConversationId;
use chatrelay_core::queue::SummaryQueue;
use serde::Serialize;
use tracing::{debug, warn};

pub struct HttpSummaryQueue {
    url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpSummaryQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSummaryQueue")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct EnqueueBody<'a> {
    url: &'a str,
    chat_id: &'a str,
}

impl HttpSummaryQueue {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &chatrelay_config::SummaryQueueConfig) -> Self {
        Self::new(&config.url, config.api_key.clone())
    }
}

#[async_trait]
impl SummaryQueue for HttpSummaryQueue {
    async fn enqueue(&self, url: &str, conversation_id: &ConversationId) -> Result<(), ChannelError> {
        let body = EnqueueBody {
            url,
            chat_id: conversation_id.as_str(),
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Api-Key {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ChannelError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), reason = %reason, "Summary queue rejected job");
            return Err(ChannelError::DeliveryFailed {
                channel: "summary_queue".into(),
                reason: format!("HTTP {status}: {reason}"),
            });
        }

        debug!(conversation_id = %conversation_id, url, "Summary job enqueued");
        Ok(())
    }
}
