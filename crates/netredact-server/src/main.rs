//! Redaction service server binary.

mod config;
mod telemetry;

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::info;

use netredact_api::{create_router, ApiConfig, AppState, SlidingWindowLimiter};
use netredact_storage::{InMemoryMappingStore, MappingStore, RedisMappingStore};

use crate::config::ServerConfig;
use crate::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = ServerConfig::load().context("Failed to load configuration")?;

    init_telemetry(&config.telemetry)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting redaction service"
    );

    let state = build_app_state(&config).await?;
    let app = create_router(state.clone());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    // Drain: stop advertising readiness, then release per-request state.
    state.ready.store(false, Ordering::SeqCst);
    state.limiter.reset().await;
    state
        .store
        .shutdown()
        .await
        .context("Mapping store shutdown failed")?;

    info!("Server shut down gracefully");
    Ok(())
}

/// Builds the application state.
async fn build_app_state(config: &ServerConfig) -> Result<AppState> {
    let store = init_store(config).await?;
    store
        .startup()
        .await
        .context("Mapping store startup failed")?;

    let limiter = SlidingWindowLimiter::new(
        config.rate_limit_requests,
        Duration::from_secs(config.rate_limit_window_seconds),
    )
    .context("Invalid rate limit configuration")?;

    Ok(AppState::new(
        ApiConfig {
            max_payload_bytes: config.max_payload_bytes,
            request_timeout: Duration::from_secs(config.request_timeout_seconds),
            deterministic_secret: config.deterministic_secret.clone().into_bytes(),
        },
        store,
        Arc::new(limiter),
    ))
}

/// Selects the mapping store backend.
async fn init_store(config: &ServerConfig) -> Result<Arc<dyn MappingStore>> {
    let ttl = config.mapping_ttl_seconds.map(Duration::from_secs);

    match &config.redis_url {
        Some(url) => {
            let store = RedisMappingStore::connect(url, ttl)
                .await
                .context("Failed to connect to Redis")?;
            info!(store = store.name(), "Mapping store ready");
            Ok(Arc::new(store))
        }
        None => {
            let store = InMemoryMappingStore::new(
                ttl,
                Duration::from_secs(config.cleanup_interval_seconds),
            );
            info!(store = store.name(), "Mapping store ready");
            Ok(Arc::new(store))
        }
    }
}

/// Shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
