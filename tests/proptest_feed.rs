//! Property-Based Tests - Feed Policy Invariants
//!
//! Uses `proptest` to verify that configuration validation and the
//! transport selection policy hold across random inputs.

use proptest::prelude::*;

use kitchen_status_feed::usecases::TransportSelector;
use kitchen_status_feed::{ConfigError, FeedConfig, FeedError, FeedState, TransportKind};

fn transport_kind() -> impl Strategy<Value = TransportKind> {
    prop_oneof![Just(TransportKind::Push), Just(TransportKind::Poll)]
}

// ── Configuration Properties ────────────────────────────────

proptest! {
    /// A config is valid exactly when every timing field is positive.
    #[test]
    fn config_valid_iff_all_positive(
        prefer_push in any::<bool>(),
        interval_ms in 0u64..10_000,
        reconnect_ms in 0u64..60_000,
        retries in 0u32..20,
    ) {
        let config = FeedConfig::from_millis(prefer_push, interval_ms, reconnect_ms, retries);
        let expected = interval_ms > 0 && reconnect_ms > 0 && retries > 0;
        prop_assert_eq!(config.validate().is_ok(), expected);
    }

    /// The interval is checked before anything else.
    #[test]
    fn zero_interval_always_reported_first(
        reconnect_ms in 0u64..60_000,
        retries in 0u32..20,
    ) {
        let config = FeedConfig::from_millis(true, 0, reconnect_ms, retries);
        prop_assert_eq!(config.validate(), Err(ConfigError::InvalidInterval));
    }
}

// ── Transport Selection Properties ──────────────────────────

proptest! {
    /// Push is chosen only when both preferred and available.
    #[test]
    fn initial_push_requires_preference_and_availability(
        prefer_push in any::<bool>(),
        push_available in any::<bool>(),
    ) {
        let selector = TransportSelector::new(prefer_push);
        let kind = selector.initial(push_available);
        prop_assert_eq!(kind == TransportKind::Push, prefer_push && push_available);
    }

    /// Push falls back to polling; polling has no fallback.
    #[test]
    fn fallback_never_returns_push(prefer_push in any::<bool>(), failed in transport_kind()) {
        let next = TransportSelector::new(prefer_push).fallback(failed);
        match failed {
            TransportKind::Push => prop_assert_eq!(next, Some(TransportKind::Poll)),
            TransportKind::Poll => prop_assert_eq!(next, None),
        }
    }
}

// ── Error and State Properties ──────────────────────────────

proptest! {
    /// Only a clean push close ends a subscription among close errors.
    #[test]
    fn only_clean_push_close_is_terminal(transport in transport_kind(), was_clean in any::<bool>()) {
        let err = FeedError::Closed { transport, was_clean };
        prop_assert_eq!(err.is_terminal(), transport == TransportKind::Push && was_clean);
    }

    /// Exactly the active states report a transport.
    #[test]
    fn active_state_reports_its_transport(kind in transport_kind()) {
        prop_assert_eq!(FeedState::Active(kind).active_transport(), Some(kind));
        prop_assert!(!FeedState::Active(kind).is_terminated());
    }
}
