//! HTTP gateway for chatrelay.
//!
//! - `POST /webhook`: Telegram updates. Always answers `200` so Telegram never
//!   retries; a bad secret gets the body `Unauthorized`, everything else `ok`.
//! - `GET /health`: pings the history store.
//!
//! Built on Axum.

use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
};
use chatrelay_agent::Dispatcher;
use chatrelay_channels::Update;
use chatrelay_channels::webhook::{SECRET_HEADER, SecretToken};
use chatrelay_core::HistoryStore;
use chatrelay_core::message::InboundMessage;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Request bodies above this size are rejected before parsing.
pub const BODY_LIMIT: usize = 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub dispatcher: Dispatcher,
    pub history: Arc<dyn HistoryStore>,
    pub secret: SecretToken,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/webhook", post(webhook_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn start(state: SharedState, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
        })
        .await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    match state.history.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "Healthy" })),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "Unhealthy",
                }),
            )
        }
    }
}

async fn webhook_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let presented = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if !state.secret.matches(presented) {
        warn!("Webhook secret mismatch");
        return (StatusCode::OK, "Unauthorized");
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, body_len = body.len(), "Unparseable webhook body");
            return (StatusCode::OK, "ok");
        }
    };

    let Some(message) = update.message else {
        debug!(update_id = update.update_id, "Update without message, skipping");
        return (StatusCode::OK, "ok");
    };

    let inbound = InboundMessage::from(message);
    info!(
        update_id = update.update_id,
        conversation_id = %inbound.conversation_id,
        "Webhook message received"
    );
    state.dispatcher.handle(inbound).await;

    (StatusCode::OK, "ok")
}
