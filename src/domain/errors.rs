//! Feed error taxonomy.
//!
//! `ConfigError` is fatal and raised synchronously before any transport
//! runs. `TransportError` is recoverable and travels inside `FeedEvent`s.
//! `FeedError` is what the caller's callback receives after connect.

use thiserror::Error;

use super::feed::TransportKind;

/// Fatal misconfiguration detected before a transport is started.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No authentication credential available")]
    MissingCredential,
    #[error("Polling interval must be greater than zero")]
    InvalidInterval,
    #[error("Reconnect delay must be greater than zero")]
    InvalidReconnectDelay,
    #[error("Max polling retries must be at least 1")]
    InvalidRetryLimit,
}

/// Recoverable failure reported by a running transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// An inbound push message was not valid structured data.
    #[error("Failed to parse push message: {0}")]
    Parse(String),
    /// The push channel reported an error or could not be opened.
    #[error("Push transport fault: {0}")]
    Fault(String),
    /// A status fetch failed.
    #[error("Status fetch failed: {0}")]
    Fetch(String),
}

/// Error delivered to the subscriber callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("{transport} transport error: {source}")]
    Transport {
        transport: TransportKind,
        #[source]
        source: TransportError,
    },
    #[error("{transport} transport closed (clean: {was_clean})")]
    Closed {
        transport: TransportKind,
        was_clean: bool,
    },
    /// Raised while reconnecting, e.g. the credential disappeared.
    #[error("Feed configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl FeedError {
    /// Whether the subscription stops delivering after this error.
    pub const fn is_terminal(&self) -> bool {
        match self {
            Self::Transport { .. } => false,
            Self::Closed { transport, was_clean } => {
                matches!(transport, TransportKind::Push) && *was_clean
            }
            Self::Configuration(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_push_close_is_terminal() {
        let err = FeedError::Closed { transport: TransportKind::Push, was_clean: true };
        assert!(err.is_terminal());
    }

    #[test]
    fn test_poll_close_is_not_terminal() {
        let err = FeedError::Closed { transport: TransportKind::Poll, was_clean: false };
        assert!(!err.is_terminal());
        assert_eq!(err.to_string(), "poll transport closed (clean: false)");
    }

    #[test]
    fn test_transport_error_display() {
        let err = FeedError::Transport {
            transport: TransportKind::Push,
            source: TransportError::Parse("expected value".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "push transport error: Failed to parse push message: expected value"
        );
    }
}
