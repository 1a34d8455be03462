//! Reconnect Supervisor - Transport Ownership and Failure Policy
//!
//! Owns the single active transport of one subscription and reacts to
//! its events:
//! 1. `Data` is forwarded to the subscriber verbatim
//! 2. Push `TransportError` / unclean `Closed` → stop push, fall back to polling
//! 3. Push clean `Closed` → terminate, no fallback
//! 4. Polling `Closed` (retries exhausted) → full reconnect after a delay
//!
//! Each started transport gets a fresh generation number. Events from
//! older generations are discarded, so a replaced transport can never
//! reach the subscriber even if it queued something before it stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use super::transport_selector::TransportSelector;
use crate::adapters::feeds::{
  EventSink, FeedEnvelope, PollingTransport, PushTransport, TransportDiagnostics, TransportHandle,
};
use crate::domain::{
  ConfigError, FeedConfig, FeedError, FeedEvent, FeedState, StatusPayload, TransportKind,
};
use crate::ports::feed_observer::FeedObserver;
use crate::ports::status_source::CredentialProvider;

/// Subscriber callback. Receives every result exactly once, in order.
pub type FeedCallback = Box<dyn FnMut(Result<StatusPayload, FeedError>) + Send + 'static>;

/// State shared between the supervisor task and the subscription token.
pub(crate) struct SubscriptionShared {
  callback: Mutex<Option<FeedCallback>>,
  /// The one live transport. Swapped only by the supervisor, taken by cancel.
  active: Mutex<Option<TransportHandle>>,
  cancelled: AtomicBool,
  state: watch::Sender<FeedState>,
}

impl SubscriptionShared {
  pub(crate) fn new(callback: FeedCallback) -> Self {
    let (state, _) = watch::channel(FeedState::Idle);
    Self {
      callback: Mutex::new(Some(callback)),
      active: Mutex::new(None),
      cancelled: AtomicBool::new(false),
      state,
    }
  }

  pub(crate) fn is_cancelled(&self) -> bool {
    self.cancelled.load(Ordering::SeqCst)
  }

  /// Flip to cancelled. Returns `false` if already cancelled.
  pub(crate) fn mark_cancelled(&self) -> bool {
    !self.cancelled.swap(true, Ordering::SeqCst)
  }

  /// Invoke the callback unless the subscription was cancelled.
  fn deliver(&self, result: Result<StatusPayload, FeedError>) -> bool {
    let mut slot = self.callback.lock().unwrap_or_else(PoisonError::into_inner);
    if self.is_cancelled() {
      return false;
    }
    match slot.as_mut() {
      Some(callback) => {
        callback(result);
        true
      }
      None => false,
    }
  }

  /// Drop the callback if no delivery is in progress.
  ///
  /// Never blocks, so it is safe to call from inside the callback.
  pub(crate) fn release_callback(&self) {
    match self.callback.try_lock() {
      Ok(mut slot) => {
        slot.take();
      }
      Err(TryLockError::Poisoned(poisoned)) => {
        poisoned.into_inner().take();
      }
      Err(TryLockError::WouldBlock) => {}
    }
  }

  /// Make `handle` the active transport.
  ///
  /// Returns `false`, stopping the handle, if the subscription was
  /// cancelled in the meantime.
  fn install(&self, handle: TransportHandle) -> bool {
    let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
    if self.is_cancelled() {
      handle.stop();
      return false;
    }
    if let Some(previous) = active.replace(handle) {
      warn!(transport = %previous.transport(), "Replacing a transport that was not torn down");
      previous.stop();
    }
    true
  }

  /// Remove and stop the active transport, if any.
  pub(crate) fn teardown(&self) -> Option<TransportKind> {
    let handle = self.active.lock().unwrap_or_else(PoisonError::into_inner).take()?;
    handle.stop();
    Some(handle.transport())
  }

  pub(crate) fn active_diagnostics(&self) -> Option<TransportDiagnostics> {
    self
      .active
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .as_ref()
      .map(TransportHandle::diagnostics)
  }

  pub(crate) fn state(&self) -> FeedState {
    *self.state.borrow()
  }

  pub(crate) fn watch_state(&self) -> watch::Receiver<FeedState> {
    self.state.subscribe()
  }

  /// Publish `state`. Returns `false` once `Terminated` was published;
  /// a terminated subscription never leaves that state.
  pub(crate) fn publish_state(&self, state: FeedState) -> bool {
    self.state.send_if_modified(|current| {
      if current.is_terminated() {
        return false;
      }
      *current = state;
      true
    })
  }
}

/// What the run loop does after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
  Continue,
  ScheduleReconnect,
  Stop,
}

/// Drives one subscription: starts transports and applies the
/// fallback and reconnection policy.
pub(crate) struct ReconnectSupervisor {
  config: FeedConfig,
  selector: TransportSelector,
  polling: PollingTransport,
  push: Option<PushTransport>,
  credentials: Arc<dyn CredentialProvider>,
  observer: Arc<dyn FeedObserver>,
  shared: Arc<SubscriptionShared>,
  events_tx: mpsc::UnboundedSender<FeedEnvelope>,
  /// Generation of the most recently started transport.
  generation: u64,
}

impl ReconnectSupervisor {
  pub(crate) fn new(
    config: FeedConfig,
    polling: PollingTransport,
    push: Option<PushTransport>,
    credentials: Arc<dyn CredentialProvider>,
    observer: Arc<dyn FeedObserver>,
    shared: Arc<SubscriptionShared>,
    events_tx: mpsc::UnboundedSender<FeedEnvelope>,
  ) -> Self {
    Self {
      selector: TransportSelector::from_config(&config),
      config,
      polling,
      push,
      credentials,
      observer,
      shared,
      events_tx,
      generation: 0,
    }
  }

  fn set_state(&self, state: FeedState) {
    if self.shared.publish_state(state) {
      debug!(%state, "Feed state changed");
      self.observer.on_state(state);
    } else {
      trace!(%state, "Subscription terminated, state change ignored");
    }
  }

  fn next_sink(&mut self) -> EventSink {
    self.generation += 1;
    EventSink::new(self.generation, self.events_tx.clone())
  }

  /// Start the preferred transport. `Connecting → Active(_)`.
  pub(crate) fn connect(&mut self, credential: Option<String>) -> Result<TransportKind, ConfigError> {
    self.set_state(FeedState::Connecting);

    let kind = self.selector.initial(self.push.is_some());
    let handle = match (kind, self.push.clone()) {
      (TransportKind::Push, Some(push)) => {
        let sink = self.next_sink();
        push.start(credential, sink)?
      }
      _ => {
        let sink = self.next_sink();
        self.polling.start(sink)?
      }
    };
    let kind = handle.transport();

    if self.shared.install(handle) {
      info!(transport = %kind, generation = self.generation, "Feed transport active");
      self.set_state(FeedState::Active(kind));
    }
    Ok(kind)
  }

  /// Forward a result and report it to the observer.
  fn deliver(&self, transport: TransportKind, result: Result<StatusPayload, FeedError>) {
    let is_data = result.is_ok();
    if self.shared.deliver(result) {
      self.observer.on_delivery(transport, is_data);
    }
  }

  /// Process one transport event.
  fn handle_envelope(&mut self, envelope: FeedEnvelope) -> Flow {
    if envelope.generation != self.generation {
      trace!(
        generation = envelope.generation,
        current = self.generation,
        event = envelope.event.label(),
        "Discarding event from replaced transport"
      );
      return Flow::Continue;
    }
    if self.shared.is_cancelled() {
      return Flow::Stop;
    }

    let transport = envelope.transport;
    match envelope.event {
      FeedEvent::Data(payload) => {
        self.deliver(transport, Ok(payload));
        Flow::Continue
      }
      FeedEvent::TransportError(source) => {
        let failed = matches!(transport, TransportKind::Push);
        if failed {
          self.shared.teardown();
        }
        self.deliver(transport, Err(FeedError::Transport { transport, source }));
        if failed {
          self.fall_back(transport)
        } else {
          Flow::Continue
        }
      }
      FeedEvent::Closed { was_clean } => {
        self.shared.teardown();
        self.deliver(transport, Err(FeedError::Closed { transport, was_clean }));
        self.on_closed(transport, was_clean)
      }
    }
  }

  fn on_closed(&mut self, transport: TransportKind, was_clean: bool) -> Flow {
    match transport {
      TransportKind::Push if was_clean => {
        info!("Push channel closed cleanly, ending subscription");
        Flow::Stop
      }
      TransportKind::Push => self.fall_back(transport),
      TransportKind::Poll => {
        if self.shared.is_cancelled() {
          return Flow::Stop;
        }
        warn!(
          delay_ms = self.config.reconnect_delay.as_millis(),
          "Polling exhausted, scheduling reconnect"
        );
        self.set_state(FeedState::Reconnecting);
        Flow::ScheduleReconnect
      }
    }
  }

  /// `Active(push) → Degrading → Active(poll)`. The failed transport
  /// has already been torn down.
  fn fall_back(&mut self, failed: TransportKind) -> Flow {
    if self.shared.is_cancelled() {
      return Flow::Stop;
    }
    let Some(next) = self.selector.fallback(failed) else {
      return Flow::ScheduleReconnect;
    };

    warn!(from = %failed, to = %next, "Push transport failed, falling back to polling");
    self.set_state(FeedState::Degrading);

    let sink = self.next_sink();
    match self.polling.start(sink) {
      Ok(handle) => {
        if self.shared.install(handle) {
          self.observer.on_fallback();
          self.set_state(FeedState::Active(next));
          Flow::Continue
        } else {
          Flow::Stop
        }
      }
      Err(e) => {
        self.deliver(next, Err(FeedError::Configuration(e)));
        Flow::Stop
      }
    }
  }

  /// `Reconnecting → Connecting → Active(_)`.
  fn reconnect(&mut self) -> Flow {
    if self.shared.is_cancelled() {
      return Flow::Stop;
    }
    self.observer.on_reconnect();
    info!("Attempting feed reconnect");

    let Some(credential) = self.credentials.credential() else {
      warn!("No credential available on reconnect, ending subscription");
      self.deliver(
        TransportKind::Poll,
        Err(FeedError::Configuration(ConfigError::MissingCredential)),
      );
      return Flow::Stop;
    };

    match self.connect(Some(credential)) {
      Ok(_) => Flow::Continue,
      Err(e) => {
        self.deliver(TransportKind::Poll, Err(FeedError::Configuration(e)));
        Flow::Stop
      }
    }
  }

  /// Event loop. Runs until cancel, a clean push close or a fatal
  /// reconnect failure.
  #[instrument(skip_all, name = "feed_supervisor")]
  pub(crate) async fn run(
    mut self,
    mut events: mpsc::UnboundedReceiver<FeedEnvelope>,
    shutdown: CancellationToken,
  ) {
    let mut reconnect_at: Option<Instant> = None;

    loop {
      let flow = tokio::select! {
        biased;
        () = shutdown.cancelled() => Flow::Stop,
        () = tokio::time::sleep_until(reconnect_at.unwrap_or_else(Instant::now)),
          if reconnect_at.is_some() =>
        {
          reconnect_at = None;
          self.reconnect()
        },
        envelope = events.recv() => match envelope {
          Some(envelope) => self.handle_envelope(envelope),
          None => Flow::Stop,
        },
      };

      match flow {
        Flow::Continue => {}
        Flow::ScheduleReconnect => {
          reconnect_at = Some(Instant::now() + self.config.reconnect_delay);
        }
        Flow::Stop => break,
      }
    }

    if let Some(transport) = self.shared.teardown() {
      debug!(%transport, "Active transport torn down on exit");
    }
    self.shared.publish_state(FeedState::Terminated);
    self.observer.on_state(FeedState::Terminated);
    self.shared.release_callback();
    info!("Status feed subscription ended");
  }
}
