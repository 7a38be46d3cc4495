//! Verxio checkout gateway HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! cargo run -p verxio-server --release
//!
//! # Run with custom config path
//! CONFIG=/path/to/config.toml cargo run -p verxio-server
//!
//! # Configure logging level
//! RUST_LOG=debug cargo run -p verxio-server
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to TOML configuration file (default: `config.toml`)
//! - `HOST` — Override bind address (default: `0.0.0.0`)
//! - `PORT` — Override port (default: `3000`)
//! - `REFLECT_URL` — Override the reflect earn-pool base URL
//! - `RUST_LOG` — Log level filter (default: `info`)

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderMap, Method};
use axum::{Json, Router};
use tower_http::cors;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use verxio::storage::{FileStorage, MemoryStorage, SharedStorage};
use verxio_http::reflect::ReflectClient;
use verxio_http::session::{SessionBuilder, SessionRegistry};

use verxio_server::config::ServerConfig;
use verxio_server::handlers::{CheckoutState, checkout_router};

#[tokio::main]
async fn main() {
    // Load .env first so RUST_LOG from it reaches the filter
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Checkout gateway failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        cluster = %config.session.cluster,
        reflect = %config.reflect.base_url,
        "Loaded configuration"
    );

    let storage: SharedStorage = match &config.session.storage_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Persisting referrals to disk");
            Arc::new(FileStorage::open(path))
        }
        None => Arc::new(MemoryStorage::new()),
    };

    let mut client = ReflectClient::try_from(config.reflect.base_url.as_str())?;
    if let Some(timeout) = config.reflect.timeout() {
        client = client.with_timeout(timeout);
    }
    if let Some(api_key) = &config.reflect.api_key {
        let key = api_key.trim();
        if key.is_empty() || key.starts_with('$') {
            tracing::warn!("Ignoring reflect api_key: value not resolved (missing env var?)");
        } else {
            let mut headers = HeaderMap::new();
            headers.insert("x-api-key", key.parse()?);
            client = client.with_headers(headers);
        }
    }

    let builder = SessionBuilder::new(storage)
        .with_classifier(config.session.classifier())
        .with_cluster(config.session.cluster)
        .with_loader_delay(config.session.loader_delay());

    let state = CheckoutState {
        pool: Arc::new(client),
        registry: Arc::new(SessionRegistry::new(builder)),
    };

    // Build Axum router
    let app = Router::new()
        .merge(checkout_router(state))
        .route("/health", axum::routing::get(health))
        .layer(TraceLayer::new_for_http())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers(cors::Any),
        );

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Checkout gateway listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Checkout gateway shut down gracefully");
    Ok(())
}

/// Health check endpoint.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Waits for Ctrl-C or SIGTERM (Unix) to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down..."),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down..."),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.expect("failed to listen for Ctrl-C");
        tracing::info!("Received Ctrl-C, shutting down...");
    }
}
