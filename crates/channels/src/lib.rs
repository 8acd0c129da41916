//! Chat platform adapters for chatrelay.
//!
//! - **Telegram**: Bot API `sendMessage` client and webhook update types
//! - **Webhook**: shared-secret header validation for inbound updates
//! - **Summary queue**: HTTP client for the out-of-band link summarizer

pub mod summary_queue;
pub mod telegram;
pub mod webhook;

pub use summary_queue::HttpSummaryQueue;
pub use telegram::{TelegramSender, Update};
pub use webhook::SecretToken;
