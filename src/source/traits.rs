use std::time::Duration;

use async_trait::async_trait;

use super::error::SourceError;
use crate::domain::RawMessage;

/// Ordered, at-least-once stream of raw messages
///
/// `receive` must be cancel-safe: dropping the future before it resolves
/// must not lose a message. `commit` may be called concurrently from many
/// workers.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Wait up to `timeout` for the next message
    ///
    /// Returns `SourceError::Empty` when nothing arrived in time and
    /// `SourceError::Exhausted`/`SourceError::Closed` once no more messages
    /// will ever be delivered.
    async fn receive(&self, timeout: Duration) -> Result<RawMessage, SourceError>;

    /// Acknowledge that a message reached its terminal outcome
    async fn commit(&self, message: &RawMessage) -> Result<(), SourceError>;

    /// Release the underlying connection
    async fn close(&self) -> Result<(), SourceError>;
}
