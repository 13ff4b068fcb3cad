use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashSet;
use futures::{Stream, StreamExt};
use tokio::sync::Mutex;

use super::error::SourceError;
use super::traits::MessageSource;
use crate::domain::{Offset, RawMessage};

type MessageStream = Pin<Box<dyn Stream<Item = Result<RawMessage, SourceError>> + Send>>;

/// Message source backed by any async stream of messages
///
/// The end of the stream is reported as `Exhausted`. Commits are tracked per
/// offset so a message cannot be acknowledged twice.
pub struct StreamSource {
    inner: Mutex<MessageStream>,
    committed: DashSet<Offset>,
    closed: AtomicBool,
}

impl StreamSource {
    /// Wrap a stream of messages
    ///
    /// # Example
    /// ```rust,ignore
    /// let messages = futures::stream::iter(vec![Ok(RawMessage::new("1", "boot", Offset::new(0, 0)))]);
    /// let source = StreamSource::new(messages);
    /// ```
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<RawMessage, SourceError>> + Send + 'static,
    {
        Self {
            inner: Mutex::new(Box::pin(stream)),
            committed: DashSet::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of distinct offsets committed so far
    pub fn committed_count(&self) -> usize {
        self.committed.len()
    }
}

#[async_trait]
impl MessageSource for StreamSource {
    async fn receive(&self, timeout: Duration) -> Result<RawMessage, SourceError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SourceError::Closed);
        }

        let mut stream = self.inner.lock().await;
        match tokio::time::timeout(timeout, stream.next()).await {
            Err(_) => Err(SourceError::Empty),
            Ok(None) => Err(SourceError::Exhausted),
            Ok(Some(item)) => item,
        }
    }

    async fn commit(&self, message: &RawMessage) -> Result<(), SourceError> {
        if !self.committed.insert(message.offset) {
            return Err(SourceError::AlreadyCommitted(message.offset));
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), SourceError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
