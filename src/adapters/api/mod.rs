//! Kitchen API Adapter
//!
//! Implements the HTTP side of the status feed: bearer-token
//! credentials and the REST client that fetches station status.
//!
//! Sub-modules:
//! - `auth`: bearer token providers (env var, in-memory)
//! - `client`: HTTP client with auth and error normalization
//! - `types`: API response envelope

pub mod auth;
pub mod client;
pub mod types;

pub use auth::{EnvCredentials, StaticCredential};
pub use client::{KitchenApiClient, KitchenApiConfig};
