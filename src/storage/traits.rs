use async_trait::async_trait;

use super::error::SinkError;
use crate::domain::LogRecord;

/// Durable store for validated records
///
/// Implementations must be safe to call concurrently and idempotent on
/// `LogRecord::id`: a redelivered message is stored again under the same ID.
/// Callers bound each call with a deadline by dropping the future, so a
/// store must not leave partial state behind when cancelled.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn store(&self, record: &LogRecord) -> Result<(), SinkError>;
}
