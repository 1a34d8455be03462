//! Kitchen API Credentials - Bearer Token Providers
//!
//! Staff authenticate with a bearer token. The feed asks for it on
//! every connect and reconnect, so a rotated token is picked up
//! without restarting the subscription.

use std::sync::{Arc, PoisonError, RwLock};

use crate::ports::status_source::CredentialProvider;

/// Environment variable holding the staff bearer token.
pub const AUTH_TOKEN_ENV: &str = "KITCHEN_AUTH_TOKEN";

/// Reads the bearer token from an environment variable on each call.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    /// Variable name, `KITCHEN_AUTH_TOKEN` by default.
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(AUTH_TOKEN_ENV)
    }
}

impl CredentialProvider for EnvCredentials {
    fn credential(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}

/// In-memory token that can be replaced or cleared at runtime.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct StaticCredential {
    token: Arc<RwLock<Option<String>>>,
}

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(Some(token.into()))),
        }
    }

    /// A provider with no token, i.e. logged out.
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    pub fn set(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

impl CredentialProvider for StaticCredential {
    fn credential(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .filter(|token| !token.is_empty())
    }
}
