//! Push Channel Port - Server-initiated Message Streams
//!
//! Defines the capability that opens a push channel for a credential
//! and the lifecycle frames such a channel yields. The WebSocket
//! adapter implements it; tests substitute in-memory channels.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// One lifecycle frame or message from a push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushFrame {
  /// The channel finished its handshake.
  Opened,
  /// A text message.
  Text(String),
  /// A binary message.
  Binary(Vec<u8>),
  /// The channel reported an error without closing.
  Error(String),
  /// The channel closed.
  Closed {
    /// `true` when the closing handshake completed.
    was_clean: bool,
  },
}

/// Stream of frames from one push connection.
///
/// Dropping the stream releases the underlying connection.
pub type MessageStream = BoxStream<'static, PushFrame>;

/// Opens push channels keyed by an auth credential.
#[async_trait]
pub trait PushConnector: Send + Sync + 'static {
  /// Establish a channel. `Err` means no channel was ever opened.
  async fn open(&self, credential: &str) -> anyhow::Result<MessageStream>;
}
