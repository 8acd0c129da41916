//! Message handling for chatrelay.
//!
//! Every inbound message follows the same path:
//!
//! 1. **Dispatch** under a per-message deadline ([`Dispatcher`])
//! 2. **Route** to the first matching command, else the default ([`Router`])
//! 3. For plain chat, **assemble** a bounded window of recent history
//!    ([`ContextAssembler`]), **complete**, **reply**, and **persist**
//!    ([`ConversationTurn`])

pub mod commands;
pub mod context;
pub mod dispatch;
pub mod router;
pub mod turn;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use commands::{Services, build_router, resolve_budget};
pub use context::{AssembledContext, ContextAssembler, ContextBudget, ContextEntry, ModelLimits};
pub use dispatch::Dispatcher;
pub use router::{Dispatch, Handler, Matcher, RouteBinding, Router};
pub use turn::ConversationTurn;
