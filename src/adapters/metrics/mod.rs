//! Metrics and Monitoring Adapters
//!
//! Provides Prometheus metrics export (/metrics) and health check
//! endpoints (/live, /ready) via axum 0.7.

pub mod health;
pub mod prometheus;

pub use health::HealthServer;
pub use prometheus::MetricsRegistry;
