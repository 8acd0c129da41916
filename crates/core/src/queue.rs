//! SummaryQueue trait: hands a link off to an out-of-band summarizer.
//!
//! The summarizer replies to the conversation on its own; the relay only
//! enqueues the job.

use crate::error::ChannelError;
use crate::message::ConversationId;
use async_trait::async_trait;

#[async_trait]
pub trait SummaryQueue: Send + Sync {
    /// Enqueue `url` for summarization, replying into `conversation_id`.
    async fn enqueue(
        &self,
        url: &str,
        conversation_id: &ConversationId,
    ) -> std::result::Result<(), ChannelError>;
}
