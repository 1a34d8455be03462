//! Prometheus Metrics Registry - Feed Observability
//!
//! Registers and exposes Prometheus metrics for the status feed.
//! Implements the `FeedObserver` port so the supervisor reports into
//! it without knowing about prometheus.

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::domain::{FeedState, TransportKind};
use crate::ports::feed_observer::FeedObserver;

/// Centralized Prometheus metrics for the status feed.
///
/// All metrics follow the naming convention `kitchen_feed_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Results delivered to the subscriber, by transport and outcome.
    pub deliveries: IntCounterVec,
    /// Push → polling fallbacks.
    pub fallbacks: IntCounter,
    /// Scheduled reconnects that fired.
    pub reconnects: IntCounter,
    /// Active transport (1 = active, 0 = not active).
    pub active_transport: IntGaugeVec,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let deliveries = IntCounterVec::new(
            Opts::new(
                "kitchen_feed_deliveries_total",
                "Results delivered to the feed subscriber",
            ),
            &["transport", "outcome"],
        )?;

        let fallbacks = IntCounter::new(
            "kitchen_feed_fallbacks_total",
            "Push transport failures that fell back to polling",
        )?;

        let reconnects = IntCounter::new(
            "kitchen_feed_reconnects_total",
            "Full reconnects after polling exhausted its retries",
        )?;

        let active_transport = IntGaugeVec::new(
            Opts::new(
                "kitchen_feed_active_transport",
                "Active feed transport (1=active, 0=inactive)",
            ),
            &["transport"],
        )?;

        registry.register(Box::new(deliveries.clone()))?;
        registry.register(Box::new(fallbacks.clone()))?;
        registry.register(Box::new(reconnects.clone()))?;
        registry.register(Box::new(active_transport.clone()))?;

        Ok(Self {
            registry,
            deliveries,
            fallbacks,
            reconnects,
            active_transport,
        })
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics_self);
                async move {
                    match metrics.render() {
                        Ok(body) => (StatusCode::OK, body),
                        Err(e) => {
                            warn!(error = %e, "Failed to encode metrics");
                            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
                        }
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}

impl FeedObserver for MetricsRegistry {
    fn on_state(&self, state: FeedState) {
        let active = state.active_transport();
        for kind in [TransportKind::Push, TransportKind::Poll] {
            self.active_transport
                .with_label_values(&[kind.as_str()])
                .set(i64::from(active == Some(kind)));
        }
    }

    fn on_delivery(&self, transport: TransportKind, is_data: bool) {
        let outcome = if is_data { "data" } else { "error" };
        self.deliveries
            .with_label_values(&[transport.as_str(), outcome])
            .inc();
    }

    fn on_fallback(&self) {
        self.fallbacks.inc();
    }

    fn on_reconnect(&self) {
        self.reconnects.inc();
    }
}
