//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the feed core requires from
//! the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `StatusFetcher` / `CredentialProvider`: one-shot status retrieval
//! - `PushConnector`: server-initiated message channels
//! - `FeedObserver`: telemetry hooks for metrics and health

pub mod feed_observer;
pub mod push_channel;
pub mod status_source;
