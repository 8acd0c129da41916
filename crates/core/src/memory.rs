//! HistoryStore trait: persisted conversation history.
//!
//! The store is the source of truth for message order within a conversation.
//! Reads return the most recent messages, oldest first; appends preserve the
//! order of the slice they are given.

use crate::error::MemoryError;
use crate::message::{ConversationId, Message};
use async_trait::async_trait;

/// Implementations: SQLite, in-memory (for tests and ephemeral runs).
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Up to `limit` most recent messages of a conversation, in chronological order.
    async fn fetch_history(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> std::result::Result<Vec<Message>, MemoryError>;

    /// Append messages to a conversation's history.
    async fn append_history(
        &self,
        conversation_id: &ConversationId,
        messages: &[Message],
    ) -> std::result::Result<(), MemoryError>;

    /// Cheap liveness probe, used by the keep-alive heartbeat and `/health`.
    async fn ping(&self) -> std::result::Result<(), MemoryError> {
        Ok(())
    }
}
