//! Domain layer - Feed entities and error taxonomy.
//!
//! Pure types shared by the transports and the supervisor.
//! No I/O allowed here (hexagonal architecture inner ring).

pub mod errors;
pub mod feed;

// Re-export core types for convenience
pub use errors::{ConfigError, FeedError, TransportError};
pub use feed::{FeedConfig, FeedEvent, FeedState, StatusPayload, TransportKind};
