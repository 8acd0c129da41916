//! Slash-command handlers and the router they are wired into.
//!
//! | Route | Pattern | Reply |
//! |-------|---------|-------|
//! | `echo` | `/echo (.+)` | the captured text, prefixed |
//! | `start` | `/start` | a fixed greeting |
//! | `summary` | `/summary (.+)` | a model-written summary of the capture |
//! | `summary_url` | `/summary_url (.+)` | none; the link goes to the summary queue |
//! | `prompt` | `/prompt (.+)` | the raw completion for the capture |
//!
//! Anything else falls through to [`ConversationTurn`]. Commands never touch
//! conversation history.

use crate::context::{ContextBudget, ModelLimits};
use crate::router::{Handler, Router};
use crate::turn::ConversationTurn;
use async_trait::async_trait;
use chatrelay_config::AppConfig;
use chatrelay_core::error::{ChannelError, Error, Result};
use chatrelay_core::message::{ChatMessage, InboundMessage};
use chatrelay_core::provider::CompletionRequest;
use chatrelay_core::{HistoryStore, MessageSender, Provider, SummaryQueue};
use std::sync::Arc;
use tracing::info;

pub const START_GREETING: &str =
    "Hello! I'm a bot. Send me a message and I'll echo it back to you.";

/// The capabilities handlers are built from.
#[derive(Clone)]
pub struct Services {
    pub provider: Arc<dyn Provider>,
    pub sender: Arc<dyn MessageSender>,
    pub history: Arc<dyn HistoryStore>,
    /// `/summary_url` is only registered when this is set.
    pub summary_queue: Option<Arc<dyn SummaryQueue>>,
}

/// Model settings shared by every handler that calls the provider.
#[derive(Debug, Clone)]
struct Completion {
    model: String,
    max_tokens: Option<u32>,
}

impl Completion {
    /// A single user message in, the first choice's content out.
    async fn once(&self, provider: &dyn Provider, prompt: String) -> Result<String> {
        let request = CompletionRequest::new(&self.model, vec![ChatMessage::user(prompt)])
            .with_max_tokens(self.max_tokens);
        let response = provider.complete(request).await?;
        Ok(response.first_content()?.to_string())
    }
}

pub struct EchoCommand {
    sender: Arc<dyn MessageSender>,
}

#[async_trait]
impl Handler for EchoCommand {
    async fn handle(&self, message: &InboundMessage, capture: Option<&str>) -> Result<()> {
        let reply = format!("Received your message: {}", capture.unwrap_or_default());
        self.sender.send(&message.conversation_id, &reply).await?;
        Ok(())
    }
}

pub struct StartCommand {
    sender: Arc<dyn MessageSender>,
}

#[async_trait]
impl Handler for StartCommand {
    async fn handle(&self, message: &InboundMessage, _capture: Option<&str>) -> Result<()> {
        self.sender
            .send(&message.conversation_id, START_GREETING)
            .await?;
        Ok(())
    }
}

pub struct SummaryCommand {
    provider: Arc<dyn Provider>,
    sender: Arc<dyn MessageSender>,
    completion: Completion,
}

#[async_trait]
impl Handler for SummaryCommand {
    async fn handle(&self, message: &InboundMessage, capture: Option<&str>) -> Result<()> {
        let prompt = format!(
            "Make a summary of the following text:\n\n{}\n\n",
            capture.unwrap_or_default()
        );
        let content = self.completion.once(self.provider.as_ref(), prompt).await?;
        self.sender
            .send(&message.conversation_id, &format!("Summary:\n\n{content}"))
            .await?;
        Ok(())
    }
}

pub struct SummaryUrlCommand {
    queue: Arc<dyn SummaryQueue>,
    url_pattern: regex_lite::Regex,
}

impl SummaryUrlCommand {
    pub fn new(queue: Arc<dyn SummaryQueue>) -> Result<Self> {
        let url_pattern = regex_lite::Regex::new(r"https?://[^\s]+").map_err(|e| Error::Config {
            message: format!("url pattern: {e}"),
        })?;
        Ok(Self { queue, url_pattern })
    }
}

#[async_trait]
impl Handler for SummaryUrlCommand {
    async fn handle(&self, message: &InboundMessage, capture: Option<&str>) -> Result<()> {
        let capture = capture.unwrap_or_default();
        let url = self
            .url_pattern
            .find(capture)
            .map(|m| m.as_str())
            .ok_or_else(|| ChannelError::InvalidPayload(format!("no URL found in '{capture}'")))?;

        self.queue.enqueue(url, &message.conversation_id).await?;
        info!(conversation_id = %message.conversation_id, url, "Link queued for summary");
        Ok(())
    }
}

pub struct PromptCommand {
    provider: Arc<dyn Provider>,
    sender: Arc<dyn MessageSender>,
    completion: Completion,
}

#[async_trait]
impl Handler for PromptCommand {
    async fn handle(&self, message: &InboundMessage, capture: Option<&str>) -> Result<()> {
        let content = self
            .completion
            .once(self.provider.as_ref(), capture.unwrap_or_default().to_string())
            .await?;
        self.sender.send(&message.conversation_id, &content).await?;
        Ok(())
    }
}

/// Resolve the context budget from config: explicit override, else the model table.
pub fn resolve_budget(config: &AppConfig) -> Result<ContextBudget> {
    let limits = ModelLimits::with_defaults().with_overrides(&config.context.model_limits);
    ContextBudget::resolve(&config.model, &limits, config.context.budget_chars)
}

/// Wire every command and the conversation turn into a router.
///
/// Fails if the configured model has no known size limit and no budget
/// override is set.
pub fn build_router(services: Services, config: &AppConfig) -> Result<Router> {
    let budget = resolve_budget(config)?;
    let completion = Completion {
        model: config.model.clone(),
        max_tokens: config.max_tokens,
    };

    let mut router = Router::new();
    router
        .add_pattern(
            "echo",
            "/echo (.+)",
            Arc::new(EchoCommand {
                sender: services.sender.clone(),
            }),
        )?
        .add_pattern(
            "start",
            "/start",
            Arc::new(StartCommand {
                sender: services.sender.clone(),
            }),
        )?;

    router.set_default_handler(Arc::new(
        ConversationTurn::new(
            services.provider.clone(),
            services.sender.clone(),
            services.history.clone(),
            &config.model,
            budget,
        )
        .with_max_tokens(config.max_tokens)
        .with_history_limit(config.history_limit),
    ));

    router.add_pattern(
        "summary",
        "/summary (.+)",
        Arc::new(SummaryCommand {
            provider: services.provider.clone(),
            sender: services.sender.clone(),
            completion: completion.clone(),
        }),
    )?;

    if let Some(queue) = services.summary_queue.clone() {
        router.add_pattern(
            "summary_url",
            "/summary_url (.+)",
            Arc::new(SummaryUrlCommand::new(queue)?),
        )?;
    }

    router.add_pattern(
        "prompt",
        "/prompt (.+)",
        Arc::new(PromptCommand {
            provider: services.provider,
            sender: services.sender,
            completion,
        }),
    )?;

    info!(
        routes = ?router.route_ids(),
        model = %config.model,
        budget = budget.chars(),
        "Router ready"
    );
    Ok(router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Dispatch;
    use crate::test_helpers::*;

    fn services(log: &CallLog, with_queue: bool) -> Services {
        Services {
            provider: Arc::new(MockProvider {
                log: log.clone(),
                reply: Some("model says hi".into()),
            }),
            sender: Arc::new(MockSender {
                log: log.clone(),
                fail: false,
            }),
            history: Arc::new(MockHistory::new(log.clone())),
            summary_queue: with_queue.then(|| {
                Arc::new(MockQueue { log: log.clone() }) as Arc<dyn SummaryQueue>
            }),
        }
    }

    fn router(log: &CallLog, with_queue: bool) -> Router {
        build_router(services(log, with_queue), &AppConfig::default()).unwrap()
    }

    fn touched_history(log: &CallLog) -> bool {
        log.calls()
            .iter()
            .any(|c| matches!(c, Call::Fetch { .. } | Call::Append { .. }))
    }

    #[test]
    fn routes_in_declaration_order() {
        let log = CallLog::default();
        assert_eq!(
            router(&log, true).route_ids(),
            vec!["echo", "start", "summary", "summary_url", "prompt"]
        );
        assert_eq!(
            router(&log, false).route_ids(),
            vec!["echo", "start", "summary", "prompt"]
        );
        assert!(router(&log, false).has_default());
    }

    #[tokio::test]
    async fn start_sends_greeting_only() {
        let log = CallLog::default();
        let outcome = router(&log, false)
            .process(&InboundMessage::text("5", "/start"))
            .await
            .unwrap();

        assert_eq!(outcome, Dispatch::Route { id: "start".into() });
        assert_eq!(log.sends(), vec![START_GREETING.to_string()]);
        assert!(!touched_history(&log));
        assert!(log.requests().is_empty());
    }

    #[tokio::test]
    async fn echo_replies_with_capture() {
        let log = CallLog::default();
        router(&log, false)
            .process(&InboundMessage::text("5", "/echo ping pong"))
            .await
            .unwrap();

        assert_eq!(log.sends(), vec!["Received your message: ping pong".to_string()]);
        assert!(!touched_history(&log));
    }

    #[tokio::test]
    async fn summary_wraps_prompt_and_reply() {
        let log = CallLog::default();
        let outcome = router(&log, false)
            .process(&InboundMessage::text("5", "/summary long text"))
            .await
            .unwrap();

        assert_eq!(outcome, Dispatch::Route { id: "summary".into() });
        let requests = log.requests();
        assert_eq!(
            requests[0].messages,
            vec![ChatMessage::user(
                "Make a summary of the following text:\n\nlong text\n\n"
            )]
        );
        assert_eq!(log.sends(), vec!["Summary:\n\nmodel says hi".to_string()]);
        assert!(!touched_history(&log));
    }

    #[tokio::test]
    async fn prompt_forwards_capture_verbatim() {
        let log = CallLog::default();
        router(&log, false)
            .process(&InboundMessage::text("5", "/prompt what is rust?"))
            .await
            .unwrap();

        assert_eq!(
            log.requests()[0].messages,
            vec![ChatMessage::user("what is rust?")]
        );
        assert_eq!(log.sends(), vec!["model says hi".to_string()]);
    }

    #[tokio::test]
    async fn summary_url_enqueues_first_link() {
        let log = CallLog::default();
        let outcome = router(&log, true)
            .process(&InboundMessage::text(
                "5",
                "/summary_url read https://example.com/post?id=1 and http://other.org",
            ))
            .await
            .unwrap();

        assert_eq!(outcome, Dispatch::Route { id: "summary_url".into() });
        let calls = log.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(
            &calls[0],
            Call::Enqueue { url, conversation } if url == "https://example.com/post?id=1" && conversation == "5"
        ));
    }

    #[tokio::test]
    async fn summary_url_without_link_is_error() {
        let log = CallLog::default();
        let err = router(&log, true)
            .process(&InboundMessage::text("5", "/summary_url nothing here"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Channel(ChannelError::InvalidPayload(_))));
        assert!(log.calls().is_empty());
    }

    #[tokio::test]
    async fn summary_url_without_queue_falls_to_conversation() {
        let log = CallLog::default();
        let outcome = router(&log, false)
            .process(&InboundMessage::text("5", "/summary_url https://example.com"))
            .await
            .unwrap();

        assert_eq!(outcome, Dispatch::Fallback);
        assert!(touched_history(&log));
    }

    #[tokio::test]
    async fn plain_text_runs_conversation_turn() {
        let log = CallLog::default();
        let outcome = router(&log, false)
            .process(&InboundMessage::text("5", "hello"))
            .await
            .unwrap();

        assert_eq!(outcome, Dispatch::Fallback);
        assert_eq!(log.calls().len(), 5);
    }

    #[test]
    fn unknown_model_fails_router_build() {
        let log = CallLog::default();
        let config = AppConfig {
            model: "mystery-model".into(),
            ..AppConfig::default()
        };
        let err = build_router(services(&log, false), &config).err().unwrap();
        assert!(matches!(err, Error::UnknownModel(_)));
    }

    #[test]
    fn budget_override_and_configured_limits() {
        let mut config = AppConfig {
            model: "gpt-4o".into(),
            ..AppConfig::default()
        };
        config.context.model_limits.insert("gpt-4o".into(), 1000);
        assert_eq!(resolve_budget(&config).unwrap().chars(), 500);

        config.context.budget_chars = Some(42);
        assert_eq!(resolve_budget(&config).unwrap().chars(), 42);
    }
}
