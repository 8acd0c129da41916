//! # chatrelay core
//!
//! Domain types, capability traits, and error definitions for the chatrelay
//! Telegram-to-LLM relay. This crate has **no I/O**: it defines the domain
//! model that every other crate implements against.
//!
//! Each external collaborator is a trait here:
//! - [`Provider`]: chat completions
//! - [`MessageSender`]: deliver text to a conversation
//! - [`HistoryStore`]: persisted conversation history
//! - [`SummaryQueue`]: hand a URL off to the out-of-band summarizer

pub mod channel;
pub mod error;
pub mod memory;
pub mod message;
pub mod provider;
pub mod queue;

// Re-export key types at crate root for ergonomics
pub use channel::MessageSender;
pub use error::{Error, Result};
pub use memory::HistoryStore;
pub use message::{ChatMessage, ConversationId, InboundMessage, Message, Role};
pub use provider::{Choice, CompletionRequest, CompletionResponse, Provider, Usage};
pub use queue::SummaryQueue;
