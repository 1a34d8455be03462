//! Transport Handle - Ownership and Teardown of One Running Transport
//!
//! Every transport runs as its own tokio task and reports through an
//! `EventSink`. The `TransportHandle` returned by `start` is the only
//! way to stop it. Stopping closes a gate that every emission passes
//! through, so once `stop()` returns the transport can no longer emit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, trace};

use crate::domain::{FeedEvent, TransportKind};

/// A transport event tagged with the handle that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEnvelope {
    /// Generation of the handle, assigned by the owner of the sink.
    pub generation: u64,
    /// Transport that produced the event.
    pub transport: TransportKind,
    /// The event itself.
    pub event: FeedEvent,
}

/// Destination for a transport's events.
///
/// The generation lets the receiver discard anything a replaced
/// transport managed to queue before it was stopped.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<FeedEnvelope>,
}

impl EventSink {
    pub const fn new(generation: u64, tx: mpsc::UnboundedSender<FeedEnvelope>) -> Self {
        Self { generation, tx }
    }

    /// Create a sink together with its receiving end.
    pub fn channel(generation: u64) -> (Self, mpsc::UnboundedReceiver<FeedEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(generation, tx), rx)
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Point-in-time diagnostics for a transport handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportDiagnostics {
    pub transport: TransportKind,
    pub generation: u64,
    pub started_at: DateTime<Utc>,
    /// When the push channel finished its handshake. Always `None` for polling.
    pub opened_at: Option<DateTime<Utc>>,
    pub events_emitted: u64,
    pub stopped: bool,
}

/// State shared between a handle and its running task.
#[derive(Debug)]
struct HandleShared {
    /// Emission gate. Held while sending so `stop()` cannot interleave.
    stopped: Mutex<bool>,
    cancel: CancellationToken,
    started_at: DateTime<Utc>,
    opened_at: OnceLock<DateTime<Utc>>,
    events_emitted: AtomicU64,
}

impl HandleShared {
    fn is_stopped(&self) -> bool {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Task-side view of a handle: emits events and watches for stop.
#[derive(Debug)]
pub(crate) struct Emitter {
    sink: EventSink,
    transport: TransportKind,
    shared: Arc<HandleShared>,
}

impl Emitter {
    /// Send an event unless the handle was stopped.
    pub(crate) fn emit(&self, event: FeedEvent) {
        let stopped = self.shared.stopped.lock().unwrap_or_else(PoisonError::into_inner);
        if *stopped {
            trace!(
                transport = %self.transport,
                event = event.label(),
                "Transport stopped, event discarded"
            );
            return;
        }

        self.shared.events_emitted.fetch_add(1, Ordering::Relaxed);
        let envelope = FeedEnvelope {
            generation: self.sink.generation,
            transport: self.transport,
            event,
        };
        if self.sink.tx.send(envelope).is_err() {
            debug!(transport = %self.transport, "Event receiver dropped");
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.shared.is_stopped()
    }

    /// Record the open timestamp. Only the first call counts.
    pub(crate) fn mark_opened(&self) -> DateTime<Utc> {
        *self.shared.opened_at.get_or_init(Utc::now)
    }

    /// Resolves once the handle is stopped.
    pub(crate) fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.shared.cancel.cancelled()
    }
}

/// Opaque handle to one running transport.
///
/// Dropping the handle stops the transport.
#[derive(Debug)]
pub struct TransportHandle {
    transport: TransportKind,
    generation: u64,
    shared: Arc<HandleShared>,
    task: Option<JoinHandle<()>>,
    /// Abort the task on stop instead of letting in-flight work settle.
    abort_on_stop: bool,
}

impl TransportHandle {
    /// Create a handle and the emitter its task reports through.
    pub(crate) fn new(transport: TransportKind, sink: EventSink) -> (Self, Emitter) {
        let shared = Arc::new(HandleShared {
            stopped: Mutex::new(false),
            cancel: CancellationToken::new(),
            started_at: Utc::now(),
            opened_at: OnceLock::new(),
            events_emitted: AtomicU64::new(0),
        });

        let handle = Self {
            transport,
            generation: sink.generation,
            shared: Arc::clone(&shared),
            task: None,
            abort_on_stop: false,
        };
        let emitter = Emitter { sink, transport, shared };
        (handle, emitter)
    }

    /// Attach the spawned task driving this transport.
    pub(crate) fn attach(&mut self, task: JoinHandle<()>, abort_on_stop: bool) {
        self.task = Some(task);
        self.abort_on_stop = abort_on_stop;
    }

    pub const fn transport(&self) -> TransportKind {
        self.transport
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop the transport. Returns `false` if it was already stopped.
    ///
    /// No event is emitted once this returns.
    pub fn stop(&self) -> bool {
        {
            let mut stopped = self.shared.stopped.lock().unwrap_or_else(PoisonError::into_inner);
            if *stopped {
                return false;
            }
            *stopped = true;
        }

        self.shared.cancel.cancel();
        if self.abort_on_stop {
            if let Some(task) = &self.task {
                task.abort();
            }
        }

        debug!(
            transport = %self.transport,
            generation = self.generation,
            "Transport stopped"
        );
        true
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.is_stopped()
    }

    /// Whether the transport task has exited on its own or after stop.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    pub fn diagnostics(&self) -> TransportDiagnostics {
        TransportDiagnostics {
            transport: self.transport,
            generation: self.generation,
            started_at: self.shared.started_at,
            opened_at: self.shared.opened_at.get().copied(),
            events_emitted: self.shared.events_emitted.load(Ordering::Relaxed),
            stopped: self.is_stopped(),
        }
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_tags_generation_and_transport() {
        let (sink, mut rx) = EventSink::channel(7);
        let (handle, emitter) = TransportHandle::new(TransportKind::Poll, sink);

        emitter.emit(FeedEvent::Closed { was_clean: true });

        let envelope = rx.recv().await.expect("event");
        assert_eq!(envelope.generation, 7);
        assert_eq!(envelope.transport, TransportKind::Poll);
        assert_eq!(handle.diagnostics().events_emitted, 1);
    }

    #[tokio::test]
    async fn test_no_emission_after_stop() {
        let (sink, mut rx) = EventSink::channel(1);
        let (handle, emitter) = TransportHandle::new(TransportKind::Push, sink);

        assert!(handle.stop());
        emitter.emit(FeedEvent::Closed { was_clean: false });

        assert!(emitter.is_stopped());
        assert!(rx.try_recv().is_err());
        assert_eq!(handle.diagnostics().events_emitted, 0);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (sink, _rx) = EventSink::channel(1);
        let (handle, emitter) = TransportHandle::new(TransportKind::Poll, sink);

        assert!(handle.stop());
        assert!(!handle.stop());
        emitter.cancelled().await;
        assert!(handle.is_stopped());
    }

    #[test]
    fn test_opened_at_recorded_once() {
        let (sink, _rx) = EventSink::channel(1);
        let (handle, emitter) = TransportHandle::new(TransportKind::Push, sink);

        assert!(handle.diagnostics().opened_at.is_none());
        let first = emitter.mark_opened();
        let second = emitter.mark_opened();
        assert_eq!(first, second);
        assert_eq!(handle.diagnostics().opened_at, Some(first));
    }
}
