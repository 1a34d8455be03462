//! Health Check Server - Liveness and Readiness Probes
//!
//! Exposes /live and /ready endpoints via axum 0.7. Readiness follows
//! the feed subscription: ready only while a transport is active.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::sync::{broadcast, watch};
use tracing::{info, instrument};

use crate::domain::FeedState;

/// Axum-based health check HTTP server.
///
/// Serves liveness (/live) and readiness (/ready) endpoints for
/// container health checks and orchestrator probes.
pub struct HealthServer {
    /// Feed state published by the subscription token.
    state_rx: watch::Receiver<FeedState>,
    /// Bind port (default 8080 from config).
    port: u16,
}

impl HealthServer {
    /// Create a new health server.
    pub const fn new(state_rx: watch::Receiver<FeedState>, port: u16) -> Self {
        Self { state_rx, port }
    }

    /// Run the health check server until shutdown.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = Self::router(self.state_rx);

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!(address = %addr, "Health server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    fn router(state_rx: watch::Receiver<FeedState>) -> Router {
        Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .with_state(state_rx)
    }

    /// Liveness probe: always returns 200 if the process is running.
    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    /// Readiness probe: returns 200 only while a feed transport is active.
    async fn readiness(State(rx): State<watch::Receiver<FeedState>>) -> impl IntoResponse {
        readiness_status(*rx.borrow())
    }
}

fn readiness_status(state: FeedState) -> (StatusCode, String) {
    match state.active_transport() {
        Some(kind) => (StatusCode::OK, format!("READY ({kind})")),
        None => (StatusCode::SERVICE_UNAVAILABLE, format!("NOT READY ({state})")),
    }
}
