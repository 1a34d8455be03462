//! Kitchen Status Feed - Library Root
//!
//! Resilient real-time station status client: push channel first,
//! polling fallback, automatic reconnect. Re-exports all modules for
//! the binary and integration tests.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;

pub use domain::{ConfigError, FeedConfig, FeedError, FeedState, StatusPayload, TransportKind};
pub use usecases::{StatusFeedClient, SubscriptionToken};
