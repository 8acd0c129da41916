//! `chatrelay serve`: Run the webhook server.

use chatrelay_agent::{Dispatcher, Services, build_router};
use chatrelay_channels::{HttpSummaryQueue, SecretToken, TelegramSender};
use chatrelay_core::SummaryQueue;
use chatrelay_core::error::ProviderError;
use chatrelay_gateway::GatewayState;
use chatrelay_providers::OpenAiCompatProvider;
use chatrelay_workflow::Heartbeat;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub async fn run(config_path: Option<&Path>, port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    if config.provider.api_key.as_deref().is_none_or(str::is_empty) {
        return Err(ProviderError::NotConfigured("set provider.api_key or OPENAI_API_KEY".into()).into());
    }

    let history = super::open_history(&config).await?;
    let summary_queue = config
        .summary_queue
        .as_ref()
        .map(|q| Arc::new(HttpSummaryQueue::from_config(q)) as Arc<dyn SummaryQueue>);

    let services = Services {
        provider: Arc::new(OpenAiCompatProvider::from_config(&config.provider)),
        sender: Arc::new(TelegramSender::from_config(&config.telegram)?),
        history: history.clone(),
        summary_queue,
    };
    let router = build_router(services, &config)?;
    let dispatcher =
        Dispatcher::new(Arc::new(router)).with_timeout(Duration::from_millis(config.timeout_ms));

    let heartbeat = Heartbeat::from_config(&config.heartbeat, history.clone()).start();

    let secret = SecretToken::new(config.telegram.webhook_secret.clone());
    if !secret.is_configured() {
        warn!("No webhook secret configured: every update will be answered Unauthorized");
    }

    let state = Arc::new(GatewayState {
        dispatcher,
        history,
        secret,
    });

    println!("chatrelay");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.model);
    println!("   Storage:   {}", config.storage.backend);
    println!("   Secret:    {}", if state.secret.is_configured() { "configured" } else { "not set, rejecting all updates" });

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let result = chatrelay_gateway::start(state, &addr).await;

    if let Some(handle) = heartbeat {
        handle.abort();
    }
    info!("Gateway stopped");
    result
}
