//! Core status feed domain types.
//!
//! Defines the entities shared by the transports and the supervisor:
//! feed configuration, transport events, transport kinds and the
//! supervisor's lifecycle states. No I/O lives here.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, TransportError};

/// Structured status payload, forwarded to the caller verbatim.
///
/// The concrete schema belongs to the collaborator serving it.
pub type StatusPayload = serde_json::Value;

// ────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────

/// Immutable configuration for one logical subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    /// Try the push transport first when a connector is available.
    pub prefer_push: bool,
    /// Delay between the end of one poll and the start of the next.
    pub polling_interval: Duration,
    /// Delay before a full reconnect after polling gave up.
    pub reconnect_delay: Duration,
    /// Consecutive polling failures tolerated before polling closes.
    pub max_polling_retries: u32,
}

impl FeedConfig {
    pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(3000);
    pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);
    pub const DEFAULT_MAX_POLLING_RETRIES: u32 = 5;

    /// Build a config from millisecond values, as stored in `config.toml`.
    pub const fn from_millis(
        prefer_push: bool,
        polling_interval_ms: u64,
        reconnect_delay_ms: u64,
        max_polling_retries: u32,
    ) -> Self {
        Self {
            prefer_push,
            polling_interval: Duration::from_millis(polling_interval_ms),
            reconnect_delay: Duration::from_millis(reconnect_delay_ms),
            max_polling_retries,
        }
    }

    /// Reject configurations no transport could run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polling_interval.is_zero() {
            return Err(ConfigError::InvalidInterval);
        }
        if self.reconnect_delay.is_zero() {
            return Err(ConfigError::InvalidReconnectDelay);
        }
        if self.max_polling_retries == 0 {
            return Err(ConfigError::InvalidRetryLimit);
        }
        Ok(())
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            prefer_push: true,
            polling_interval: Self::DEFAULT_POLLING_INTERVAL,
            reconnect_delay: Self::DEFAULT_RECONNECT_DELAY,
            max_polling_retries: Self::DEFAULT_MAX_POLLING_RETRIES,
        }
    }
}

// ────────────────────────────────────────────
// Transports and events
// ────────────────────────────────────────────

/// Which leaf transport produced an event or is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Server-initiated message channel (WebSocket).
    Push,
    /// Client-initiated request loop.
    Poll,
}

impl TransportKind {
    /// Stable lowercase label for logs and metrics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Poll => "poll",
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event emitted by a transport and consumed only by the supervisor.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A status payload was received.
    Data(StatusPayload),
    /// A recoverable failure on the transport.
    TransportError(TransportError),
    /// The transport terminated.
    Closed {
        /// `true` when both ends acknowledged the shutdown.
        was_clean: bool,
    },
}

impl FeedEvent {
    /// Short label for logs.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Data(_) => "data",
            Self::TransportError(_) => "transport_error",
            Self::Closed { .. } => "closed",
        }
    }
}

// ────────────────────────────────────────────
// Supervisor lifecycle
// ────────────────────────────────────────────

/// Lifecycle of one logical subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "transport", rename_all = "snake_case")]
pub enum FeedState {
    Idle,
    Connecting,
    Active(TransportKind),
    /// Push failed; polling fallback is being started.
    Degrading,
    /// Polling gave up; a full reconnect is scheduled.
    Reconnecting,
    Terminated,
}

impl FeedState {
    /// The transport currently delivering events, if any.
    pub const fn active_transport(self) -> Option<TransportKind> {
        match self {
            Self::Active(kind) => Some(kind),
            _ => None,
        }
    }

    pub const fn is_terminated(self) -> bool {
        matches!(self, Self::Terminated)
    }
}

impl std::fmt::Display for FeedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Active(kind) => write!(f, "active({kind})"),
            Self::Degrading => write!(f, "degrading"),
            Self::Reconnecting => write!(f, "reconnecting"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FeedConfig::default();
        assert!(config.prefer_push);
        assert_eq!(config.polling_interval, Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = FeedConfig::from_millis(true, 0, 5000, 5);
        assert_eq!(config.validate(), Err(ConfigError::InvalidInterval));
    }

    #[test]
    fn test_zero_retries_rejected() {
        let config = FeedConfig::from_millis(false, 3000, 5000, 0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidRetryLimit));
    }

    #[test]
    fn test_state_active_transport() {
        assert_eq!(
            FeedState::Active(TransportKind::Push).active_transport(),
            Some(TransportKind::Push)
        );
        assert_eq!(FeedState::Degrading.active_transport(), None);
        assert_eq!(FeedState::Active(TransportKind::Poll).to_string(), "active(poll)");
    }
}
