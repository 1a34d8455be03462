//! Station Status WebSocket Connector - Push Channel over tokio-tungstenite
//!
//! Implements the `PushConnector` port against the kitchen backend's
//! station-status socket. The socket URL is derived from the HTTP API
//! base URL (`http` → `ws`, `https` → `wss`) and the credential travels
//! as the `token` query parameter.
//!
//! Frame mapping:
//! - Handshake complete → `Opened`
//! - Text / binary → `Text` / `Binary` (ping/pong handled by tungstenite)
//! - Close frame received → `Closed { was_clean: true }`
//! - Read error → `Error`, then `Closed { was_clean: false }`
//! - Stream ended without a close frame → `Closed { was_clean: false }`

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, instrument, warn};

use crate::ports::push_channel::{MessageStream, PushConnector, PushFrame};

/// Default socket path relative to the API host.
pub const DEFAULT_WS_PATH: &str = "/api/kitchen/station-status";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Read-side state of one socket while it is being streamed.
enum SocketState {
    Open(Box<WsStream>),
    /// A read error was reported; the unclean close is still owed.
    Failed,
    Done,
}

/// WebSocket connector for station status pushes.
#[derive(Debug, Clone)]
pub struct WsStatusConnector {
    /// Socket endpoint without credentials.
    endpoint: Url,
}

impl WsStatusConnector {
    /// Derive the socket endpoint from the HTTP API base URL.
    ///
    /// `ws://` and `wss://` base URLs are accepted unchanged.
    pub fn from_base_url(base_url: &str, path: &str) -> Result<Self> {
        let mut endpoint = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {base_url}"))?;

        let scheme = match endpoint.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => anyhow::bail!("Unsupported scheme for push channel: {other}"),
        };
        endpoint
            .set_scheme(scheme)
            .map_err(|()| anyhow::anyhow!("Cannot switch {base_url} to {scheme}"))?;
        endpoint.set_path(path);
        endpoint.set_query(None);

        Ok(Self { endpoint })
    }

    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Full socket URL with the credential as `token` query parameter.
    pub fn url_for(&self, credential: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("token", credential);
        url
    }
}

#[async_trait]
impl PushConnector for WsStatusConnector {
    #[instrument(skip(self, credential), fields(endpoint = %self.endpoint))]
    async fn open(&self, credential: &str) -> Result<MessageStream> {
        let url = self.url_for(credential);

        // Never log `url`: it carries the credential.
        info!("Connecting to station status WebSocket");
        let (ws_stream, response) = connect_async(url.as_str())
            .await
            .context("Station status WebSocket connection failed")?;

        info!(status = %response.status(), "Station status WebSocket connected");

        let frames = stream::unfold(SocketState::Open(Box::new(ws_stream)), next_frame);
        Ok(stream::once(async { PushFrame::Opened }).chain(frames).boxed())
    }
}

/// Pull the next meaningful frame off the socket.
async fn next_frame(state: SocketState) -> Option<(PushFrame, SocketState)> {
    let mut ws = match state {
        SocketState::Open(ws) => ws,
        SocketState::Failed => {
            return Some((PushFrame::Closed { was_clean: false }, SocketState::Done));
        }
        SocketState::Done => return None,
    };

    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                return Some((PushFrame::Text(text), SocketState::Open(ws)));
            }
            Some(Ok(Message::Binary(bytes))) => {
                return Some((PushFrame::Binary(bytes), SocketState::Open(ws)));
            }
            Some(Ok(Message::Close(frame))) => {
                debug!(?frame, "Close frame received");
                return Some((PushFrame::Closed { was_clean: true }, SocketState::Done));
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
            Some(Err(e)) => {
                warn!(error = %e, "Station status WebSocket error");
                return Some((PushFrame::Error(e.to_string()), SocketState::Failed));
            }
            None => {
                return Some((PushFrame::Closed { was_clean: false }, SocketState::Done));
            }
        }
    }
}
