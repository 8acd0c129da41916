//! The default conversation turn: history → window → completion → reply → persist.

use crate::context::{ContextAssembler, ContextBudget};
use crate::router::Handler;
use async_trait::async_trait;
use chatrelay_core::error::{Error, Result};
use chatrelay_core::message::{InboundMessage, Message};
use chatrelay_core::provider::CompletionRequest;
use chatrelay_core::{HistoryStore, MessageSender, Provider};
use std::sync::Arc;
use tracing::{debug, info};

/// How many stored messages are read before windowing.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Runs for every message no command claims.
pub struct ConversationTurn {
    provider: Arc<dyn Provider>,
    sender: Arc<dyn MessageSender>,
    history: Arc<dyn HistoryStore>,
    model: String,
    max_tokens: Option<u32>,
    assembler: ContextAssembler,
    history_limit: usize,
}

impl ConversationTurn {
    pub fn new(
        provider: Arc<dyn Provider>,
        sender: Arc<dyn MessageSender>,
        history: Arc<dyn HistoryStore>,
        model: impl Into<String>,
        budget: ContextBudget,
    ) -> Self {
        Self {
            provider,
            sender,
            history,
            model: model.into(),
            max_tokens: None,
            assembler: ContextAssembler::new(budget.chars()),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }
}

#[async_trait]
impl Handler for ConversationTurn {
    async fn handle(&self, message: &InboundMessage, _capture: Option<&str>) -> Result<()> {
        let conversation = &message.conversation_id;
        let text = message
            .text_content()
            .ok_or_else(|| Error::Internal("conversation turn needs message text".into()))?;

        let mut candidate = self
            .history
            .fetch_history(conversation, self.history_limit)
            .await?;
        let user_message = Message::user(text);
        candidate.push(user_message.clone());

        let window = self.assembler.assemble(&candidate);
        debug!(
            conversation_id = %conversation,
            kept = window.messages.len(),
            dropped = window.dropped,
            total_chars = window.total_chars,
            budget = self.assembler.budget(),
            "Context assembled"
        );

        let request = CompletionRequest::new(&self.model, window.messages)
            .with_max_tokens(self.max_tokens);
        let response = self.provider.complete(request).await?;
        let reply = response.first_content()?.to_string();

        self.sender.send(conversation, &reply).await?;

        self.history
            .append_history(conversation, &[user_message])
            .await?;
        self.history
            .append_history(conversation, &[Message::assistant(&reply)])
            .await?;

        info!(
            conversation_id = %conversation,
            content_len = reply.len(),
            "Conversation turn complete"
        );
        Ok(())
    }
}
