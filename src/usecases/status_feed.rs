//! Status Feed Client - Public Entry Point for Live Status Updates
//!
//! Binds the collaborators (status fetcher, optional push connector,
//! credential provider) and hands out independent subscriptions. Each
//! `connect` validates synchronously, starts the first transport, and
//! spawns a `ReconnectSupervisor` task that owns it from then on.
//!
//! Must be called from within a tokio runtime.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use super::supervisor::{FeedCallback, ReconnectSupervisor, SubscriptionShared};
use crate::adapters::feeds::{PollingTransport, PushTransport, TransportDiagnostics};
use crate::domain::{ConfigError, FeedConfig, FeedError, FeedState, StatusPayload};
use crate::ports::feed_observer::{FeedObserver, NoopObserver};
use crate::ports::push_channel::PushConnector;
use crate::ports::status_source::{CredentialProvider, StatusFetcher};

/// Resilient status feed: push first, polling fallback, automatic recovery.
///
/// Owns no process-wide state; every client carries its own
/// collaborators and every subscription its own transports and timers.
#[derive(Clone)]
pub struct StatusFeedClient {
  fetcher: Arc<dyn StatusFetcher>,
  push: Option<Arc<dyn PushConnector>>,
  credentials: Arc<dyn CredentialProvider>,
  observer: Arc<dyn FeedObserver>,
}

impl StatusFeedClient {
  /// Create a polling-only client. Add push with [`Self::with_push`].
  pub fn new(fetcher: Arc<dyn StatusFetcher>, credentials: Arc<dyn CredentialProvider>) -> Self {
    Self {
      fetcher,
      push: None,
      credentials,
      observer: Arc::new(NoopObserver),
    }
  }

  /// Make the push transport available.
  #[must_use]
  pub fn with_push(mut self, connector: Arc<dyn PushConnector>) -> Self {
    self.push = Some(connector);
    self
  }

  /// Report lifecycle and delivery events to `observer`.
  #[must_use]
  pub fn with_observer(mut self, observer: Arc<dyn FeedObserver>) -> Self {
    self.observer = observer;
    self
  }

  pub fn push_available(&self) -> bool {
    self.push.is_some()
  }

  /// Open a subscription.
  ///
  /// `callback` receives every status payload and every post-connect
  /// failure, in order, until the subscription ends or is cancelled.
  ///
  /// # Errors
  /// Fails fast with a [`ConfigError`] on an invalid `config` or a
  /// missing credential. No transport is started in that case.
  pub fn connect<F>(&self, config: FeedConfig, callback: F) -> Result<SubscriptionToken, ConfigError>
  where
    F: FnMut(Result<StatusPayload, FeedError>) + Send + 'static,
  {
    config.validate()?;
    let credential = self
      .credentials
      .credential()
      .ok_or(ConfigError::MissingCredential)?;

    let id = Uuid::new_v4();
    let span = info_span!("status_feed", subscription = %id);
    let _entered = span.enter();

    let callback: FeedCallback = Box::new(callback);
    let shared = Arc::new(SubscriptionShared::new(callback));
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let polling = PollingTransport::new(
      Arc::clone(&self.fetcher),
      config.polling_interval,
      config.max_polling_retries,
    );
    let push = self.push.as_ref().map(|c| PushTransport::new(Arc::clone(c)));

    let mut supervisor = ReconnectSupervisor::new(
      config,
      polling,
      push,
      Arc::clone(&self.credentials),
      Arc::clone(&self.observer),
      Arc::clone(&shared),
      events_tx,
    );
    let transport = supervisor.connect(Some(credential))?;

    let shutdown = CancellationToken::new();
    tokio::spawn(
      supervisor
        .run(events_rx, shutdown.clone())
        .instrument(span.clone()),
    );

    info!(
      %transport,
      prefer_push = config.prefer_push,
      push_available = self.push_available(),
      polling_interval_ms = config.polling_interval.as_millis(),
      "Status feed connected"
    );

    Ok(SubscriptionToken {
      id,
      shared,
      shutdown,
    })
  }
}

/// Handle to one live subscription.
///
/// Dropping the token cancels the subscription.
pub struct SubscriptionToken {
  id: Uuid,
  shared: Arc<SubscriptionShared>,
  shutdown: CancellationToken,
}

impl SubscriptionToken {
  pub const fn id(&self) -> Uuid {
    self.id
  }

  /// Stop the subscription. Idempotent.
  ///
  /// On return the active transport is stopped, the reconnect timer is
  /// cancelled and the callback will not be invoked again. Safe to
  /// call from inside the callback.
  pub fn cancel(&self) {
    if !self.shared.mark_cancelled() {
      return;
    }

    if let Some(transport) = self.shared.teardown() {
      info!(subscription = %self.id, %transport, "Status feed cancelled");
    }
    self.shutdown.cancel();
    self.shared.publish_state(FeedState::Terminated);
    self.shared.release_callback();
  }

  pub fn is_cancelled(&self) -> bool {
    self.shared.is_cancelled()
  }

  /// Current supervisor state.
  pub fn state(&self) -> FeedState {
    self.shared.state()
  }

  /// Receiver notified on every state change.
  pub fn watch_state(&self) -> watch::Receiver<FeedState> {
    self.shared.watch_state()
  }

  /// Diagnostics of the active transport, if one is running.
  pub fn active_transport(&self) -> Option<TransportDiagnostics> {
    self.shared.active_diagnostics()
  }
}

impl Drop for SubscriptionToken {
  fn drop(&mut self) {
    self.cancel();
  }
}

impl std::fmt::Debug for SubscriptionToken {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SubscriptionToken")
      .field("id", &self.id)
      .field("state", &self.state())
      .field("cancelled", &self.is_cancelled())
      .finish()
  }
}
