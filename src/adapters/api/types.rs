//! Kitchen API Types - Response Envelope
//!
//! Every kitchen endpoint answers with the same envelope:
//! `{ "status": bool, "data": ..., "message": "..." }`.

use anyhow::Result;
use serde::Deserialize;

use crate::domain::StatusPayload;

/// Standard response envelope of the kitchen API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
  /// `true` when the backend considers the call successful.
  #[serde(default)]
  pub status: bool,
  /// Endpoint-specific payload.
  #[serde(default)]
  pub data: Option<StatusPayload>,
  /// Human-readable message, usually present on failure.
  #[serde(default)]
  pub message: Option<String>,
}

impl ApiEnvelope {
  /// Unwrap the payload of a successful envelope.
  ///
  /// # Errors
  /// Fails with the server message when `status` is false, or when a
  /// successful envelope carries no `data`.
  pub fn into_data(self, fallback_message: &str) -> Result<StatusPayload> {
    if !self.status {
      let message = self
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| fallback_message.to_string());
      anyhow::bail!(message);
    }

    self
      .data
      .ok_or_else(|| anyhow::anyhow!("Invalid response from server: missing data"))
  }
}

/// Body of a non-2xx response, when the backend sends one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
  #[serde(default)]
  pub message: Option<String>,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn test_successful_envelope_yields_data() {
    let env: ApiEnvelope = serde_json::from_value(json!({
      "status": true,
      "data": [{ "station": "grill", "pending": 3 }]
    }))
    .unwrap();
    let data = env.into_data("Failed to fetch station status").unwrap();
    assert_eq!(data, json!([{ "station": "grill", "pending": 3 }]));
  }

  #[test]
  fn test_failed_envelope_uses_server_message() {
    let env: ApiEnvelope =
      serde_json::from_value(json!({ "status": false, "message": "Unauthenticated." })).unwrap();
    let err = env.into_data("Failed to fetch station status").unwrap_err();
    assert_eq!(err.to_string(), "Unauthenticated.");
  }

  #[test]
  fn test_failed_envelope_without_message_uses_fallback() {
    let env: ApiEnvelope = serde_json::from_value(json!({})).unwrap();
    let err = env.into_data("Failed to fetch station status").unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch station status");
  }

  #[test]
  fn test_success_without_data_is_error() {
    let env: ApiEnvelope = serde_json::from_value(json!({ "status": true })).unwrap();
    assert!(env.into_data("x").is_err());
  }
}
