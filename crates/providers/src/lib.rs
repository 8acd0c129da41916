//! Chat-completion providers for chatrelay.
//!
//! All providers implement the `chatrelay_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
