//! Feed Observer Port - Supervisor Telemetry Hooks
//!
//! Lets metrics and health adapters follow a subscription without
//! the supervisor depending on them. All hooks default to no-ops.

use crate::domain::{FeedState, TransportKind};

/// Receives lifecycle notifications from the supervisor.
///
/// Hooks run on the supervisor task and must not block.
pub trait FeedObserver: Send + Sync + 'static {
  /// The supervisor entered a new state.
  fn on_state(&self, _state: FeedState) {}

  /// A result was delivered to the subscriber callback.
  fn on_delivery(&self, _transport: TransportKind, _is_data: bool) {}

  /// Push failed and polling took over.
  fn on_fallback(&self) {}

  /// A scheduled reconnect fired.
  fn on_reconnect(&self) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl FeedObserver for NoopObserver {}
