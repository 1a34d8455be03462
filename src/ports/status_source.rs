//! Status Source Port - One-shot Status Retrieval and Credentials
//!
//! Defines the collaborator the polling transport calls on every
//! cycle, and the credential supplier consulted on every connect.

use async_trait::async_trait;

use crate::domain::StatusPayload;

/// One-shot authenticated retrieval of the current status.
///
/// Implementors own their own timeouts and auth headers. Any HTTP
/// or auth failure must surface as `Err`.
#[async_trait]
pub trait StatusFetcher: Send + Sync + 'static {
  /// Fetch the current status snapshot.
  async fn fetch_status(&self) -> anyhow::Result<StatusPayload>;
}

/// Supplies the current auth credential.
///
/// `None` means unauthenticated, which the feed treats as a
/// configuration error at connect time.
pub trait CredentialProvider: Send + Sync + 'static {
  fn credential(&self) -> Option<String>;
}
