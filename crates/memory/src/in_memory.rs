//! In-memory history store: useful for testing and ephemeral runs.

use async_trait::async_trait;
use chatrelay_core::error::MemoryError;
use chatrelay_core::memory::HistoryStore;
use chatrelay_core::message::{ConversationId, Message};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Keeps every conversation as a `Vec` in insertion order. Lost on restart.
#[derive(Clone, Default)]
pub struct InMemoryHistory {
    conversations: Arc<RwLock<HashMap<ConversationId, Vec<Message>>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn fetch_history(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<Message>, MemoryError> {
        let conversations = self.conversations.read().await;
        let history = conversations
            .get(conversation_id)
            .map(|messages| {
                let start = messages.len().saturating_sub(limit);
                messages[start..].to_vec()
            })
            .unwrap_or_default();
        Ok(history)
    }

    async fn append_history(
        &self,
        conversation_id: &ConversationId,
        messages: &[Message],
    ) -> Result<(), MemoryError> {
        self.conversations
            .write()
            .await
            .entry(conversation_id.clone())
            .or_default()
            .extend_from_slice(messages);
        Ok(())
    }
}
