//! # ROFL x402 Document Summarization Server
//!
//! Paid, asynchronous document-summarization service whose responses are
//! signed by a key held inside a TEE.
//!
//! ## Features
//!
//! - Asynchronous job lifecycle: submission returns immediately, summaries
//!   are produced off the request path
//! - Response attestation with recoverable SECP256K1 signatures over a
//!   canonical JSON digest
//! - Key provisioning via the ROFL keymanager (or a mock key in development)
//! - Pluggable AI backends (Ollama, Gaia)
//!
//! ## Usage
//!
//! ```bash
//! # Development with a mock signing key
//! DEBUG_SIGNING=true cargo run
//!
//! # Production (keys provisioned by the ROFL keymanager)
//! ENVIRONMENT=production cargo run
//!
//! # Gaia backend
//! AI_PROVIDER=gaia GAIA_NODE_URL=... GAIA_API_KEY=... cargo run
//! ```
//!
//! ## API Endpoints
//!
//! - `GET /` - Service information
//! - `GET /health` - Health check
//! - `GET /status` - Detailed server status
//! - `POST /summarize-doc` - Submit a document (paid endpoint)
//! - `GET /summarize-doc/{job_id}` - Poll a job (signed when enabled)

use std::sync::Arc;

use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use docsum_server::config::Config;
use docsum_server::routes::create_routes;
use docsum_server::services::jobs::InMemoryJobStore;
use docsum_server::services::keymanager::RoflAppdClient;
use docsum_server::services::signing::SigningService;
use docsum_server::services::summarizer;
use docsum_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        provider = %config.provider.as_str(),
        signing_mode = ?config.signing_mode,
        "Starting document summarization server"
    );

    // Initialize response signing. Provisioning failures are absorbed: the
    // service runs unsigned rather than refusing to start.
    let key_manager = RoflAppdClient::new(config.rofl_appd_url.clone());
    let signer = SigningService::initialize(config.signing_mode, &key_manager).await;
    if let Some(public_key) = signer.public_key_hex() {
        info!(%public_key, "Response signing enabled");
    }

    // Select the AI backend
    let summarizer = summarizer::from_config(&config)?;

    // Create application state
    let store = Arc::new(InMemoryJobStore::new());
    let state = AppState::new(store, summarizer, signer, &config);

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_origin(Any);

    // Build router
    let app = create_routes(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.socket_addr();
    info!(%addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize logging based on configuration
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .init();
    }
}
