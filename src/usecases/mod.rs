//! Use Cases Layer - Status Feed Orchestration
//!
//! Combines the leaf transports into one resilient subscription.
//!
//! Use cases:
//! - `StatusFeedClient`: connect / cancel entry point
//! - `ReconnectSupervisor`: fallback and reconnection policy
//! - `TransportSelector`: push vs. polling decision

pub mod status_feed;
pub mod supervisor;
pub mod transport_selector;

pub use status_feed::{StatusFeedClient, SubscriptionToken};
pub use supervisor::FeedCallback;
pub use transport_selector::TransportSelector;
