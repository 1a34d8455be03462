//! Status Feed Transports - Push and Polling Leaves
//!
//! Provides the two leaf transports driven by the supervisor:
//! - Polling: fixed-delay status requests with bounded retries
//! - Push: server-initiated channel with per-message parsing
//! - WebSocket: tokio-tungstenite implementation of the push port
//! - Handle: ownership, teardown and diagnostics of a running transport

pub mod handle;
pub mod polling;
pub mod push;
pub mod websocket;

pub use handle::{EventSink, FeedEnvelope, TransportDiagnostics, TransportHandle};
pub use polling::PollingTransport;
pub use push::PushTransport;
pub use websocket::WsStatusConnector;
