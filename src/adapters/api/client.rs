//! Kitchen HTTP Client - Authenticated REST Status Retrieval
//!
//! Wraps reqwest with bearer-token auth and error normalization for
//! the kitchen backend. Implements the `StatusFetcher` port used by
//! the polling transport. No retries here; the polling transport
//! owns the retry budget.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};

use super::types::{ApiEnvelope, ApiErrorBody};
use crate::domain::StatusPayload;
use crate::ports::status_source::{CredentialProvider, StatusFetcher};

/// Default station status endpoint, relative to the API base URL.
pub const DEFAULT_STATUS_PATH: &str = "/kitchen/station-status";

/// Configuration for the kitchen HTTP client.
#[derive(Debug, Clone)]
pub struct KitchenApiConfig {
  /// Base URL for the kitchen API.
  pub base_url: String,
  /// Path of the station status endpoint.
  pub status_path: String,
  /// Request timeout.
  pub timeout: Duration,
}

impl Default for KitchenApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8000/api".to_string(),
      status_path: DEFAULT_STATUS_PATH.to_string(),
      timeout: Duration::from_secs(30),
    }
  }
}

/// Bearer-authenticated HTTP client for the kitchen API.
pub struct KitchenApiClient {
  /// Underlying HTTP client.
  http: Client,
  /// Token source, consulted on every request.
  credentials: Arc<dyn CredentialProvider>,
  /// Client configuration.
  config: KitchenApiConfig,
}

impl KitchenApiClient {
  /// Create a new kitchen API client.
  pub fn new(credentials: Arc<dyn CredentialProvider>, config: KitchenApiConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(2)
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self {
      http,
      credentials,
      config,
    })
  }

  /// GET an endpoint and unwrap its envelope.
  ///
  /// Errors carry the server's `message` when it sent one, otherwise
  /// the transport error or `fallback_message`.
  #[instrument(skip(self, fallback_message))]
  pub async fn get_data(&self, path: &str, fallback_message: &str) -> Result<StatusPayload> {
    let token = self
      .credentials
      .credential()
      .context("No authentication token found")?;

    let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
    let response = self
      .http
      .get(&url)
      .bearer_auth(token)
      .header("Content-Type", "application/json")
      .send()
      .await
      .with_context(|| format!("{fallback_message}: request failed"))?;

    let status = response.status();
    debug!(status = %status, "Kitchen API response");

    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      let message = Self::error_message(status, &body, fallback_message);
      warn!(status = %status, %message, "Kitchen API error");
      anyhow::bail!(message);
    }

    let envelope: ApiEnvelope = response
      .json()
      .await
      .context("Invalid response from server")?;
    envelope.into_data(fallback_message)
  }

  /// Pick the most useful message for a failed response.
  fn error_message(status: StatusCode, body: &str, fallback_message: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
      .ok()
      .and_then(|b| b.message)
      .filter(|m| !m.is_empty())
      .unwrap_or_else(|| format!("{fallback_message} (HTTP {status})"))
  }
}

#[async_trait]
impl StatusFetcher for KitchenApiClient {
  async fn fetch_status(&self) -> Result<StatusPayload> {
    self
      .get_data(&self.config.status_path, "Failed to fetch station status")
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::adapters::api::auth::StaticCredential;

  #[test]
  fn test_error_message_prefers_server_message() {
    let msg = KitchenApiClient::error_message(
      StatusCode::UNAUTHORIZED,
      r#"{"message":"Unauthenticated."}"#,
      "Failed to fetch station status",
    );
    assert_eq!(msg, "Unauthenticated.");
  }

  #[test]
  fn test_error_message_falls_back_on_status() {
    let msg = KitchenApiClient::error_message(
      StatusCode::BAD_GATEWAY,
      "<html>bad gateway</html>",
      "Failed to fetch station status",
    );
    assert_eq!(msg, "Failed to fetch station status (HTTP 502 Bad Gateway)");
  }

  #[tokio::test]
  async fn test_missing_token_fails_without_request() {
    let client = KitchenApiClient::new(
      Arc::new(StaticCredential::unauthenticated()),
      KitchenApiConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        ..KitchenApiConfig::default()
      },
    )
    .unwrap();

    let err = client.fetch_status().await.unwrap_err();
    assert_eq!(err.to_string(), "No authentication token found");
  }
}
