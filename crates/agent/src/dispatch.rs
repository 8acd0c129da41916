//! Deadline-bounded dispatch: the failure boundary for one inbound message.
//!
//! The routed chain runs as its own task and is raced against the deadline.
//! When the deadline wins, the task is left running in the background rather
//! than aborted, so a reply or history write may still land after the
//! failure was logged.

use crate::router::{Dispatch, Router};
use chatrelay_core::error::{Error, Result};
use chatrelay_core::message::InboundMessage;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, error, info_span, warn};
use uuid::Uuid;

/// Default per-message deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(20_000);

#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(router: Arc<Router>) -> Self {
        Self {
            router,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Route `message` under the deadline and return the outcome.
    pub async fn try_handle(&self, message: InboundMessage) -> Result<Dispatch> {
        let router = self.router.clone();
        let chain = tokio::spawn(
            async move { router.process(&message).await }.instrument(tracing::Span::current()),
        );

        match tokio::time::timeout(self.timeout, chain).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => Err(Error::Internal(format!(
                "message task failed: {join_error}"
            ))),
            // Dropping the JoinHandle detaches the task; it is not aborted.
            Err(_) => Err(Error::DeadlineExceeded {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    /// Route `message`, logging and swallowing every failure.
    pub async fn handle(&self, message: InboundMessage) {
        let span = info_span!(
            "dispatch",
            request_id = %Uuid::new_v4(),
            conversation_id = %message.conversation_id
        );

        async {
            match self.try_handle(message).await {
                Ok(outcome) => debug!(?outcome, "Message dispatched"),
                Err(e @ Error::DeadlineExceeded { .. }) => {
                    warn!(error = %e, "Message processing abandoned")
                }
                Err(e) => error!(error = %e, "Message processing failed"),
            }
        }
        .instrument(span)
        .await
    }
}
