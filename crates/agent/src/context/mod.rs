//! Context window selection.
//!
//! The model only sees the most recent slice of a conversation that fits in a
//! character budget. The budget comes from a per-model size table (half the
//! model's limit) or an explicit override.

pub mod assembler;
pub mod budget;

pub use assembler::{AssembledContext, ContextAssembler, ContextEntry, content_len};
pub use budget::{ContextBudget, ModelLimits};
