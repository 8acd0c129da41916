//! Pattern router: picks exactly one handler per inbound message.
//!
//! Bindings are tried in declaration order and the first whose matcher
//! accepts the text wins. Overlapping patterns are allowed; earlier ones
//! shadow later ones. If nothing matches, the default handler (if any) runs.

use async_trait::async_trait;
use chatrelay_core::error::{Error, Result};
use chatrelay_core::message::InboundMessage;
use std::sync::Arc;
use tracing::debug;

/// Decides whether a message text belongs to a binding.
pub trait Matcher: Send + Sync {
    fn test(&self, text: &str) -> bool;

    /// The first capture group, if the pattern defines one and it participated.
    fn first_capture<'t>(&self, text: &'t str) -> Option<&'t str>;
}

impl Matcher for regex_lite::Regex {
    fn test(&self, text: &str) -> bool {
        self.is_match(text)
    }

    fn first_capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Something that reacts to a routed message.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, message: &InboundMessage, capture: Option<&str>) -> Result<()>;
}

/// One `(id, matcher, handler)` entry.
pub struct RouteBinding {
    id: String,
    matcher: Box<dyn Matcher>,
    handler: Arc<dyn Handler>,
}

impl RouteBinding {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// What the router did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// No text; nothing was invoked.
    Ignored,
    /// A binding matched and its handler ran.
    Route { id: String },
    /// Nothing matched; the default handler ran.
    Fallback,
    /// Nothing matched and no default is set.
    Unhandled,
}

#[derive(Default)]
pub struct Router {
    bindings: Vec<RouteBinding>,
    default_handler: Option<Arc<dyn Handler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_route(
        &mut self,
        id: impl Into<String>,
        matcher: impl Matcher + 'static,
        handler: Arc<dyn Handler>,
    ) -> &mut Self {
        self.bindings.push(RouteBinding {
            id: id.into(),
            matcher: Box::new(matcher),
            handler,
        });
        self
    }

    /// Compile `pattern` and append it as a binding.
    pub fn add_pattern(
        &mut self,
        id: impl Into<String>,
        pattern: &str,
        handler: Arc<dyn Handler>,
    ) -> Result<&mut Self> {
        let regex = regex_lite::Regex::new(pattern).map_err(|e| Error::Config {
            message: format!("invalid route pattern '{pattern}': {e}"),
        })?;
        Ok(self.add_route(id, regex, handler))
    }

    /// Replace the default handler.
    pub fn set_default_handler(&mut self, handler: Arc<dyn Handler>) -> &mut Self {
        self.default_handler = Some(handler);
        self
    }

    pub fn has_default(&self) -> bool {
        self.default_handler.is_some()
    }

    pub fn route_ids(&self) -> Vec<&str> {
        self.bindings.iter().map(|b| b.id.as_str()).collect()
    }

    /// First-match-wins: the earliest binding accepting `text`, plus its capture.
    pub fn first_match<'t>(&self, text: &'t str) -> Option<(&RouteBinding, Option<&'t str>)> {
        self.bindings
            .iter()
            .find(|b| b.matcher.test(text))
            .map(|b| (b, b.matcher.first_capture(text)))
    }

    /// Route a message to at most one handler. Handler errors pass through.
    pub async fn process(&self, message: &InboundMessage) -> Result<Dispatch> {
        let Some(text) = message.text_content() else {
            debug!(conversation_id = %message.conversation_id, "No text, ignoring");
            return Ok(Dispatch::Ignored);
        };

        if let Some((binding, capture)) = self.first_match(text) {
            debug!(conversation_id = %message.conversation_id, route = %binding.id, "Route matched");
            binding.handler.handle(message, capture).await?;
            return Ok(Dispatch::Route {
                id: binding.id.clone(),
            });
        }

        match &self.default_handler {
            Some(handler) => {
                debug!(conversation_id = %message.conversation_id, "No route matched, using default");
                handler.handle(message, None).await?;
                Ok(Dispatch::Fallback)
            }
            None => {
                debug!(conversation_id = %message.conversation_id, "No route matched and no default");
                Ok(Dispatch::Unhandled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_core::error::ProviderError;
    use std::sync::Mutex;

    /// Records `(name, capture)` for every invocation into a shared log.
    struct Probe {
        name: &'static str,
        log: Arc<Mutex<Vec<(String, Option<String>)>>>,
        fail: bool,
    }

    #[async_trait]
    impl Handler for Probe {
        async fn handle(&self, _message: &InboundMessage, capture: Option<&str>) -> Result<()> {
            self.log
                .lock()
                .unwrap()
                .push((self.name.to_string(), capture.map(String::from)));
            if self.fail {
                return Err(ProviderError::EmptyCompletion.into());
            }
            Ok(())
        }
    }

    type Log = Arc<Mutex<Vec<(String, Option<String>)>>>;

    fn probe(name: &'static str, log: &Log) -> Arc<dyn Handler> {
        Arc::new(Probe {
            name,
            log: log.clone(),
            fail: false,
        })
    }

    fn msg(text: &str) -> InboundMessage {
        InboundMessage::text("1", text)
    }

    #[tokio::test]
    async fn first_declared_match_wins() {
        let log: Log = Arc::default();
        let mut router = Router::new();
        router
            .add_pattern("a", "/cmd (.+)", probe("a", &log))
            .unwrap()
            .add_pattern("b", "/cmd", probe("b", &log))
            .unwrap();

        let outcome = router.process(&msg("/cmd hello")).await.unwrap();
        assert_eq!(outcome, Dispatch::Route { id: "a".into() });
        assert_eq!(
            *log.lock().unwrap(),
            vec![("a".to_string(), Some("hello".to_string()))]
        );
    }

    #[tokio::test]
    async fn pattern_without_group_has_no_capture() {
        let log: Log = Arc::default();
        let mut router = Router::new();
        router.add_pattern("start", "/start", probe("start", &log)).unwrap();

        router.process(&msg("/start")).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec![("start".to_string(), None)]);
    }

    #[tokio::test]
    async fn unmatched_goes_to_default() {
        let log: Log = Arc::default();
        let mut router = Router::new();
        router.add_pattern("echo", "/echo (.+)", probe("echo", &log)).unwrap();
        router.set_default_handler(probe("default", &log));

        let outcome = router.process(&msg("just chatting")).await.unwrap();
        assert_eq!(outcome, Dispatch::Fallback);
        assert_eq!(*log.lock().unwrap(), vec![("default".to_string(), None)]);
    }

    #[tokio::test]
    async fn latest_default_replaces_earlier() {
        let log: Log = Arc::default();
        let mut router = Router::new();
        router
            .set_default_handler(probe("first", &log))
            .set_default_handler(probe("second", &log));

        router.process(&msg("hi")).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec![("second".to_string(), None)]);
    }

    #[tokio::test]
    async fn no_match_no_default_is_unhandled() {
        let log: Log = Arc::default();
        let mut router = Router::new();
        router.add_pattern("echo", "/echo (.+)", probe("echo", &log)).unwrap();

        assert_eq!(router.process(&msg("hi")).await.unwrap(), Dispatch::Unhandled);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn textless_message_is_ignored() {
        let log: Log = Arc::default();
        let mut router = Router::new();
        router.set_default_handler(probe("default", &log));

        let sticker = InboundMessage {
            conversation_id: "1".into(),
            text: None,
        };
        assert_eq!(router.process(&sticker).await.unwrap(), Dispatch::Ignored);
        assert_eq!(router.process(&msg("")).await.unwrap(), Dispatch::Ignored);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn handler_error_propagates() {
        let log: Log = Arc::default();
        let mut router = Router::new();
        router.set_default_handler(Arc::new(Probe {
            name: "broken",
            log: log.clone(),
            fail: true,
        }));

        let err = router.process(&msg("hi")).await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::EmptyCompletion)));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let log: Log = Arc::default();
        let mut router = Router::new();
        let err = router.add_pattern("bad", "/bad (", probe("bad", &log)).err().unwrap();
        assert!(matches!(err, Error::Config { .. }));
        assert!(router.route_ids().is_empty());
    }

    #[test]
    fn patterns_are_unanchored() {
        let log: Log = Arc::default();
        let mut router = Router::new();
        router.add_pattern("echo", "/echo (.+)", probe("echo", &log)).unwrap();

        let (binding, capture) = router.first_match("please /echo this").unwrap();
        assert_eq!(binding.id(), "echo");
        assert_eq!(capture, Some("this"));
        assert!(router.first_match("/echo").is_none());
    }
}
