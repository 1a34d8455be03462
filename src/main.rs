//! Kitchen Status Feed - Entry Point
//!
//! Loads configuration, initializes logging, and opens one station
//! status subscription. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Read the bearer token from the environment
//! 4. Create KitchenApiClient (polling fetcher) and WsStatusConnector (push)
//! 5. Create MetricsRegistry (feed observer)
//! 6. Connect the subscription with a logging callback
//! 7. Spawn health server (/live + /ready) and metrics server (/metrics)
//! 8. Wait for SIGINT → cancel subscription → stop servers

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use kitchen_status_feed::adapters::api::{EnvCredentials, KitchenApiClient, KitchenApiConfig};
use kitchen_status_feed::adapters::feeds::WsStatusConnector;
use kitchen_status_feed::adapters::metrics::{HealthServer, MetricsRegistry};
use kitchen_status_feed::config;
use kitchen_status_feed::ports::feed_observer::FeedObserver;
use kitchen_status_feed::{FeedError, StatusFeedClient, StatusPayload};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config = config::loader::load_config("config.toml")
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.app.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.app.name,
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.api.base_url,
        "Starting Kitchen Status Feed"
    );

    // ── 3. Shutdown signal channel ──────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 4. Credentials + transports ─────────────────────────
    let credentials = Arc::new(EnvCredentials::new(config.api.token_env.clone()));

    let api_config = KitchenApiConfig {
        base_url: config.api.base_url.clone(),
        status_path: config.api.status_path.clone(),
        timeout: config.api.timeout(),
    };
    let api_client = Arc::new(
        KitchenApiClient::new(Arc::clone(&credentials) as _, api_config)
            .context("Failed to create kitchen API client")?,
    );

    let ws_connector = Arc::new(
        WsStatusConnector::from_base_url(&config.api.base_url, &config.api.ws_path)
            .context("Failed to derive WebSocket endpoint")?,
    );

    // ── 5. Metrics registry (feed observer) ─────────────────
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to create metrics registry")?);

    let mut client = StatusFeedClient::new(api_client, credentials).with_push(ws_connector);
    if config.metrics.enabled {
        client = client.with_observer(Arc::clone(&metrics) as Arc<dyn FeedObserver>);
    }

    // ── 6. Open the subscription ────────────────────────────
    let feed_config = config.feed.to_feed_config();
    let token = client
        .connect(feed_config, log_update)
        .context("Failed to connect status feed")?;

    info!(subscription = %token.id(), state = %token.state(), "Subscription open");

    // ── 7. Spawn health + metrics servers ───────────────────
    let health = HealthServer::new(token.watch_state(), config.metrics.health_port);
    let health_shutdown = shutdown_tx.subscribe();
    let health_handle = tokio::spawn(async move {
        if let Err(e) = health.run(health_shutdown).await {
            error!(error = %e, "Health server failed");
        }
    });

    let metrics_handle = if config.metrics.enabled {
        let metrics_shutdown = shutdown_tx.subscribe();
        let bind_address = config.metrics.bind_address.clone();
        let metrics_ref = Arc::clone(&metrics);
        Some(tokio::spawn(async move {
            if let Err(e) = metrics_ref.serve(bind_address, metrics_shutdown).await {
                error!(error = %e, "Metrics server failed");
            }
        }))
    } else {
        None
    };

    // ── 8. Wait for SIGINT or the feed terminating ──────────
    let mut state_rx = token.watch_state();
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("SIGINT received, initiating graceful shutdown");
        }
        _ = state_rx.wait_for(|state| state.is_terminated()) => {
            warn!("Status feed terminated");
        }
    }

    // ── Graceful shutdown ───────────────────────────────────
    token.cancel();
    let _ = shutdown_tx.send(());

    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), health_handle).await;
    if let Some(handle) = metrics_handle {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete");
    Ok(())
}

/// Subscription callback: log every update and every feed error.
fn log_update(result: Result<StatusPayload, FeedError>) {
    match result {
        Ok(payload) => {
            let stations = payload.as_array().map_or(0, Vec::len);
            info!(stations, payload = %payload, "Station status update");
        }
        Err(e) if e.is_terminal() => error!(error = %e, "Status feed stopped"),
        Err(e) => warn!(error = %e, "Status feed error"),
    }
}
