//! MessageSender trait: the outbound half of a chat platform.
//!
//! The relay only ever needs one operation from the platform: deliver a text
//! to a conversation. Retries and backoff are the implementation's concern.

use crate::error::ChannelError;
use crate::message::ConversationId;
use async_trait::async_trait;

#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Human-readable channel name (e.g., "telegram").
    fn name(&self) -> &str;

    /// Send `text` to the given conversation.
    async fn send(
        &self,
        conversation_id: &ConversationId,
        text: &str,
    ) -> std::result::Result<(), ChannelError>;
}
