//! Axum-based HTTP gateway serving the gated chat page.
//!
//! Routes:
//! - `GET  /`        - embedded single-page chat UI
//! - `GET  /health`  - liveness (public)
//! - `POST /login`   - exchange the shared password for a bearer token
//! - `GET  /session` - transcript turns (authorized)
//! - `POST /chat`    - one chat turn (authorized)
//! - `POST /reset`   - fresh transcript (authorized)

mod gate;
pub mod handlers;
mod page;

pub use gate::AccessGate;
pub use handlers::{TIMEOUT_ERROR, UPSTREAM_ERROR, WRONG_PASSWORD_ERROR};

use crate::config::{BrandConfig, Config};
use crate::prompt::TeraEngine;
use crate::providers::{GeminiProvider, Provider};
use crate::session::SessionManager;
use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB). A post or URL never needs more.
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout. Must outlive the provider's own 60s timeout so the
/// chat handler gets to map the timeout itself.
pub const REQUEST_TIMEOUT_SECS: u64 = 75;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AccessGate>,
    pub sessions: Arc<SessionManager>,
    pub provider: Arc<dyn Provider>,
    pub engine: Arc<Mutex<TeraEngine>>,
    pub brand: BrandConfig,
    pub model: String,
    pub temperature: f64,
    pub page: Arc<String>,
}

impl AppState {
    /// Build gateway state from config with the given provider.
    pub fn from_config(config: &Config, provider: Arc<dyn Provider>) -> Result<Self> {
        let password = config
            .password
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .context(
                "No access password configured. Set REPLYGATE_PASSWORD (or `password` \
                 in config.toml) before starting the gateway.",
            )?;

        Ok(Self {
            gate: Arc::new(AccessGate::new(password)),
            sessions: Arc::new(SessionManager::new(
                &config.brand.greeting,
                config.session.max_turns,
                config.session.max_sessions,
            )),
            provider,
            engine: Arc::new(Mutex::new(TeraEngine::new()?)),
            brand: config.brand.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            page: Arc::new(page::render_page(&config.brand.name)),
        })
    }
}

/// Build the gateway router with body limits and request timeouts.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::handle_index))
        .route("/health", get(handlers::handle_health))
        .route("/login", post(handlers::handle_login))
        .route("/session", get(handlers::handle_session))
        .route("/chat", post(handlers::handle_chat))
        .route("/reset", post(handlers::handle_reset))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
}

/// Returns true when the bind address is not a loopback address.
fn is_public_bind(host: &str) -> bool {
    !matches!(
        host,
        "127.0.0.1" | "localhost" | "::1" | "[::1]" | "0:0:0:0:0:0:0:1"
    )
}

/// Run the HTTP gateway.
pub async fn run_gateway(config: Config) -> Result<()> {
    let host = config.gateway.host.clone();
    let port = config.gateway.port;

    // Refuse public bind without explicit opt-in
    if is_public_bind(&host) && !config.gateway.allow_public_bind {
        anyhow::bail!(
            "Refusing to bind to {host} — gateway would be exposed to the internet.\n\
             Fix: use --host 127.0.0.1 (default), or set\n\
             [gateway] allow_public_bind = true in config.toml (NOT recommended)."
        );
    }

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .context("parse gateway bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind gateway socket")?;

    run_gateway_with_listener(&host, listener, config).await
}

/// Run the HTTP gateway from a pre-bound listener.
pub async fn run_gateway_with_listener(
    host: &str,
    listener: tokio::net::TcpListener,
    config: Config,
) -> Result<()> {
    let actual_port = listener.local_addr()?.port();

    let provider: Arc<dyn Provider> = Arc::new(GeminiProvider::new(config.api_key.as_deref()));
    let state = AppState::from_config(&config, provider)?;

    if !has_gemini_key(&config) {
        tracing::warn!(
            "No Gemini API key found — chat requests will fail until \
             GEMINI_API_KEY is set"
        );
    }

    tracing::info!("◆ listening on {host}:{actual_port}");
    tracing::info!("  GET  / → chat page (model: {})", state.model);
    tracing::info!("  POST /login, /chat, /reset — GET /session, /health");

    let app = router(state);
    axum::serve(listener, app).await?;

    Ok(())
}

fn has_gemini_key(config: &Config) -> bool {
    config.api_key.is_some()
        || std::env::var("GEMINI_API_KEY").is_ok()
        || std::env::var("GOOGLE_API_KEY").is_ok()
}
