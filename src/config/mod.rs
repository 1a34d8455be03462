//! Configuration Module - TOML-based Feed Configuration
//!
//! Loads and validates configuration from `config.toml`.
//! Endpoints and feed timing are externalized here; the auth token
//! comes from the environment, never from the file.

pub mod loader;

use std::time::Duration;

use serde::Deserialize;

use crate::domain::FeedConfig;

/// Top-level configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the feed connects.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Application identity and logging.
  #[serde(default)]
  pub app: AppSection,
  /// Feed transport policy.
  #[serde(default)]
  pub feed: FeedSettings,
  /// Kitchen API endpoints.
  pub api: ApiConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
}

/// Application identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
  /// Human-readable instance name.
  #[serde(default = "default_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

impl Default for AppSection {
  fn default() -> Self {
    Self {
      name: default_name(),
      log_level: default_log_level(),
    }
  }
}

/// Feed transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
  /// Try the WebSocket push channel before polling.
  #[serde(default = "default_true")]
  pub prefer_push: bool,
  /// Delay between polls (milliseconds).
  #[serde(default = "default_polling_interval")]
  pub polling_interval_ms: u64,
  /// Delay before a full reconnect (milliseconds).
  #[serde(default = "default_reconnect_delay")]
  pub reconnect_delay_ms: u64,
  /// Consecutive poll failures before polling gives up.
  #[serde(default = "default_max_polling_retries")]
  pub max_polling_retries: u32,
}

impl FeedSettings {
  /// Convert to the domain feed configuration.
  pub const fn to_feed_config(&self) -> FeedConfig {
    FeedConfig::from_millis(
      self.prefer_push,
      self.polling_interval_ms,
      self.reconnect_delay_ms,
      self.max_polling_retries,
    )
  }
}

impl Default for FeedSettings {
  fn default() -> Self {
    Self {
      prefer_push: default_true(),
      polling_interval_ms: default_polling_interval(),
      reconnect_delay_ms: default_reconnect_delay(),
      max_polling_retries: default_max_polling_retries(),
    }
  }
}

/// Kitchen API endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// REST API base URL, e.g. `https://kitchen.example.com/api`.
  pub base_url: String,
  /// Station status REST path.
  #[serde(default = "default_status_path")]
  pub status_path: String,
  /// Station status WebSocket path on the API host.
  #[serde(default = "default_ws_path")]
  pub ws_path: String,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
  /// Environment variable holding the bearer token.
  #[serde(default = "default_token_env")]
  pub token_env: String,
}

impl ApiConfig {
  pub const fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_seconds)
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
  /// Health check endpoint port.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: default_true(),
      bind_address: default_metrics_addr(),
      health_port: default_health_port(),
    }
  }
}

// Default value functions for serde

fn default_name() -> String {
  "kitchen-status-feed".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

const fn default_true() -> bool {
  true
}

const fn default_polling_interval() -> u64 {
  3000
}

const fn default_reconnect_delay() -> u64 {
  5000
}

const fn default_max_polling_retries() -> u32 {
  5
}

fn default_status_path() -> String {
  crate::adapters::api::client::DEFAULT_STATUS_PATH.to_string()
}

fn default_ws_path() -> String {
  crate::adapters::feeds::websocket::DEFAULT_WS_PATH.to_string()
}

const fn default_timeout() -> u64 {
  30
}

fn default_token_env() -> String {
  crate::adapters::api::auth::AUTH_TOKEN_ENV.to_string()
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

const fn default_health_port() -> u16 {
  8080
}
