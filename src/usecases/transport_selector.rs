//! Transport Selector - Push vs. Polling Decision
//!
//! Picks the transport to start on connect and reconnect, and the
//! fallback after a failure. Pure decision logic, no I/O.

use crate::domain::{FeedConfig, TransportKind};

/// Chooses between push and polling for one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSelector {
  prefer_push: bool,
}

impl TransportSelector {
  pub const fn new(prefer_push: bool) -> Self {
    Self { prefer_push }
  }

  pub const fn from_config(config: &FeedConfig) -> Self {
    Self::new(config.prefer_push)
  }

  /// Transport to start when (re)connecting.
  ///
  /// Push is chosen only when preferred and a connector exists.
  pub const fn initial(self, push_available: bool) -> TransportKind {
    if self.prefer_push && push_available {
      TransportKind::Push
    } else {
      TransportKind::Poll
    }
  }

  /// Transport to switch to after `failed` reported a failure.
  ///
  /// `None` means there is nothing to fall back to; the supervisor
  /// schedules a full reconnect instead.
  pub const fn fallback(self, failed: TransportKind) -> Option<TransportKind> {
    match failed {
      TransportKind::Push => Some(TransportKind::Poll),
      TransportKind::Poll => None,
    }
  }
}
