//! Shared recording mocks for handler tests.
//!
//! Every mock writes into one [`CallLog`] so tests can assert on the order of
//! collaborator calls across capabilities.

use async_trait::async_trait;
use chatrelay_core::error::{ChannelError, MemoryError, ProviderError};
use chatrelay_core::message::{ChatMessage, ConversationId, Message, Role};
use chatrelay_core::provider::{Choice, CompletionRequest, CompletionResponse, Provider};
use chatrelay_core::{HistoryStore, MessageSender, SummaryQueue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum Call {
    Fetch { conversation: String, limit: usize },
    Complete(CompletionRequest),
    Send { conversation: String, text: String },
    Append { conversation: String, messages: Vec<(Role, String)> },
    Enqueue { url: String, conversation: String },
}

#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn sends(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Complete(r) => Some(r),
                _ => None,
            })
            .collect()
    }
}

/// Replies with a fixed text, or with no choices when `reply` is `None`.
pub struct MockProvider {
    pub log: CallLog,
    pub reply: Option<String>,
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let model = request.model.clone();
        self.log.push(Call::Complete(request));
        Ok(CompletionResponse {
            model,
            choices: self
                .reply
                .iter()
                .map(|r| Choice {
                    message: ChatMessage::assistant(r.clone()),
                    finish_reason: Some("stop".into()),
                })
                .collect(),
            usage: None,
        })
    }
}

pub struct MockSender {
    pub log: CallLog,
    pub fail: bool,
}

#[async_trait]
impl MessageSender for MockSender {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, conversation_id: &ConversationId, text: &str) -> Result<(), ChannelError> {
        self.log.push(Call::Send {
            conversation: conversation_id.to_string(),
            text: text.to_string(),
        });
        if self.fail {
            return Err(ChannelError::DeliveryFailed {
                channel: "mock".into(),
                reason: "down".into(),
            });
        }
        Ok(())
    }
}

/// Logs calls and keeps messages so fetches see earlier appends.
pub struct MockHistory {
    pub log: CallLog,
    pub store: Mutex<HashMap<String, Vec<Message>>>,
}

impl MockHistory {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            store: Mutex::default(),
        }
    }

    pub fn seed(&self, conversation: &str, messages: Vec<Message>) {
        self.store
            .lock()
            .unwrap()
            .insert(conversation.to_string(), messages);
    }
}

#[async_trait]
impl HistoryStore for MockHistory {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_history(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<Message>, MemoryError> {
        self.log.push(Call::Fetch {
            conversation: conversation_id.to_string(),
            limit,
        });
        let store = self.store.lock().unwrap();
        let all = store.get(conversation_id.as_str()).cloned().unwrap_or_default();
        let start = all.len().saturating_sub(limit);
        Ok(all[start..].to_vec())
    }

    async fn append_history(
        &self,
        conversation_id: &ConversationId,
        messages: &[Message],
    ) -> Result<(), MemoryError> {
        self.log.push(Call::Append {
            conversation: conversation_id.to_string(),
            messages: messages.iter().map(|m| (m.role, m.content.clone())).collect(),
        });
        self.store
            .lock()
            .unwrap()
            .entry(conversation_id.to_string())
            .or_default()
            .extend_from_slice(messages);
        Ok(())
    }
}

pub struct MockQueue {
    pub log: CallLog,
}

#[async_trait]
impl SummaryQueue for MockQueue {
    async fn enqueue(&self, url: &str, conversation_id: &ConversationId) -> Result<(), ChannelError> {
        self.log.push(Call::Enqueue {
            url: url.to_string(),
            conversation: conversation_id.to_string(),
        });
        Ok(())
    }
}
