use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::error::SourceError;
use super::traits::MessageSource;
use crate::domain::RawMessage;
use crate::shutdown::{ShutdownError, Shutdownable};

/// Source wrapper whose close runs at most once
///
/// Both the stream processor (after draining) and the shutdown coordinator
/// close the source they share. The first caller performs the real close and
/// gets its result; later callers get `Ok(())`.
pub struct CloseOnce<S> {
    name: String,
    inner: S,
    closed: AtomicBool,
}

impl<S: MessageSource> CloseOnce<S> {
    pub fn new(name: impl Into<String>, inner: S) -> Self {
        Self {
            name: name.into(),
            inner,
            closed: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: MessageSource> MessageSource for CloseOnce<S> {
    async fn receive(&self, timeout: Duration) -> Result<RawMessage, SourceError> {
        if self.is_closed() {
            return Err(SourceError::Closed);
        }
        self.inner.receive(timeout).await
    }

    async fn commit(&self, message: &RawMessage) -> Result<(), SourceError> {
        self.inner.commit(message).await
    }

    async fn close(&self) -> Result<(), SourceError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!(source = %self.name, "source already closed");
            return Ok(());
        }
        self.inner.close().await
    }
}

#[async_trait]
impl<S: MessageSource> Shutdownable for CloseOnce<S> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn shutdown(&self) -> Result<(), ShutdownError> {
        MessageSource::close(self)
            .await
            .map_err(|e| ShutdownError::Close {
                resource: self.name.clone(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    #[tokio::test]
    async fn closes_inner_source_once() {
        let source = CloseOnce::new("memory", MemorySource::new());

        source.close().await.unwrap();
        source.close().await.unwrap();
        source.shutdown().await.unwrap();

        assert!(source.is_closed());
        assert_eq!(source.inner().close_calls(), 1);
    }

    #[tokio::test]
    async fn closed_wrapper_stops_receiving() {
        let source = CloseOnce::new("memory", MemorySource::new().with_messages([("1", "a")]));
        source.shutdown().await.unwrap();

        assert!(matches!(
            source.receive(Duration::from_millis(10)).await,
            Err(SourceError::Closed)
        ));
        assert_eq!(source.inner().pending(), 1);
    }

    #[tokio::test]
    async fn concurrent_closes_reach_inner_once() {
        let source = std::sync::Arc::new(CloseOnce::new("memory", MemorySource::new()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let source = source.clone();
                tokio::spawn(async move { MessageSource::close(&*source).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(source.inner().close_calls(), 1);
    }
}
