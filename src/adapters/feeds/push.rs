//! Push Transport - Server-initiated Status Channel
//!
//! Opens a channel through the `PushConnector` port and turns its
//! frames into `FeedEvent`s:
//! - `Opened` records the open timestamp, no event
//! - Text/binary frames are parsed as JSON: `Data` or `TransportError(Parse)`
//! - Channel errors become `TransportError(Fault)`, the channel stays open
//! - Close becomes `Closed { was_clean }` and ends the task
//!
//! Parse failures never close the channel; deciding whether to abandon
//! it is left to the supervisor.

use std::sync::Arc;

use futures_util::StreamExt;
use tracing::{debug, info, instrument, warn};

use super::handle::{Emitter, EventSink, TransportHandle};
use crate::domain::{ConfigError, FeedEvent, StatusPayload, TransportError, TransportKind};
use crate::ports::push_channel::{MessageStream, PushConnector, PushFrame};

/// Push transport over an injected connector.
#[derive(Clone)]
pub struct PushTransport {
    connector: Arc<dyn PushConnector>,
}

impl PushTransport {
    pub fn new(connector: Arc<dyn PushConnector>) -> Self {
        Self { connector }
    }

    /// Spawn a task that opens the channel and streams its frames.
    ///
    /// # Errors
    /// `ConfigError::MissingCredential` when no non-empty credential is
    /// given. Nothing is opened in that case.
    #[instrument(skip(self, credential, sink), fields(generation = sink.generation()))]
    pub fn start(
        &self,
        credential: Option<String>,
        sink: EventSink,
    ) -> Result<TransportHandle, ConfigError> {
        let credential = credential
            .filter(|c| !c.trim().is_empty())
            .ok_or(ConfigError::MissingCredential)?;

        let (mut handle, emitter) = TransportHandle::new(TransportKind::Push, sink);
        let task = tokio::spawn(run_channel(Arc::clone(&self.connector), credential, emitter));
        // Stop must drop the channel right away.
        handle.attach(task, true);

        info!("Push transport started");
        Ok(handle)
    }
}

async fn run_channel(connector: Arc<dyn PushConnector>, credential: String, emitter: Emitter) {
    let opened = tokio::select! {
        biased;
        () = emitter.cancelled() => return,
        opened = connector.open(&credential) => opened,
    };

    let mut stream: MessageStream = match opened {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "Push channel could not be opened");
            emitter.emit(FeedEvent::TransportError(TransportError::Fault(format!("{e:#}"))));
            emitter.emit(FeedEvent::Closed { was_clean: false });
            return;
        }
    };

    loop {
        let frame = tokio::select! {
            biased;
            () = emitter.cancelled() => {
                debug!("Push transport stopped, dropping channel");
                return;
            }
            frame = stream.next() => frame,
        };

        match frame {
            Some(PushFrame::Opened) => {
                let opened_at = emitter.mark_opened();
                info!(%opened_at, "Push channel open");
            }
            Some(PushFrame::Text(text)) => emitter.emit(parse_message(text.as_bytes())),
            Some(PushFrame::Binary(bytes)) => emitter.emit(parse_message(&bytes)),
            Some(PushFrame::Error(reason)) => {
                warn!(%reason, "Push channel error");
                emitter.emit(FeedEvent::TransportError(TransportError::Fault(reason)));
            }
            Some(PushFrame::Closed { was_clean }) => {
                info!(was_clean, "Push channel closed");
                emitter.emit(FeedEvent::Closed { was_clean });
                return;
            }
            None => {
                warn!("Push channel ended without a close frame");
                emitter.emit(FeedEvent::Closed { was_clean: false });
                return;
            }
        }
    }
}

/// Parse one inbound message as structured data.
fn parse_message(raw: &[u8]) -> FeedEvent {
    match serde_json::from_slice::<StatusPayload>(raw) {
        Ok(payload) => FeedEvent::Data(payload),
        Err(e) => {
            debug!(error = %e, len = raw.len(), "Unparseable push message");
            FeedEvent::TransportError(TransportError::Parse(e.to_string()))
        }
    }
}
