use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, info, info_span};

use super::error::{ErrorPolicy, SkipErrors};
use super::stats::{Counters, ProcessorStats};
use crate::engine::{DEFAULT_ATTEMPT_TIMEOUT, Dispatcher, RetryPolicy};
use crate::source::{MessageSource, SourceError};
use crate::storage::Sink;

/// Default number of concurrent dispatches
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Default deadline handed to each receive call
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// Default pause after an empty read or a failed receive
pub const DEFAULT_IDLE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Tuning knobs for [`StreamProcessor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorConfig {
    pub max_workers: usize,
    pub retry: RetryPolicy,
    pub attempt_timeout: Duration,
    pub poll_timeout: Duration,
    pub idle_poll_interval: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            retry: RetryPolicy::default(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            idle_poll_interval: DEFAULT_IDLE_POLL_INTERVAL,
        }
    }
}

/// Bounded-concurrency consumer: receive, normalize, store with retries, commit
///
/// One receive loop feeds up to `max_workers` dispatch tasks. A worker slot
/// is held for the whole dispatch of a message, all retries included, and
/// released only after the message is committed. Commit order across
/// messages follows completion order, not receive order.
pub struct StreamProcessor<S, K, P = SkipErrors>
where
    S: MessageSource + 'static,
    K: Sink + 'static,
    P: ErrorPolicy + 'static,
{
    source: Arc<S>,
    sink: Arc<K>,
    error_policy: Arc<P>,
    config: ProcessorConfig,
    counters: Arc<Counters>,
    in_flight: Arc<AtomicUsize>,
}

impl<S, K> StreamProcessor<S, K, SkipErrors>
where
    S: MessageSource + 'static,
    K: Sink + 'static,
{
    /// Create a processor with default configuration that logs failures
    ///
    /// # Example
    /// ```rust,ignore
    /// let source = Arc::new(MemorySource::new().with_messages([("1", "boot")]));
    /// let sink = Arc::new(MemorySink::new());
    ///
    /// let processor = StreamProcessor::new(source, sink).with_max_workers(4);
    /// processor.start(token).await?;
    /// ```
    pub fn new(source: Arc<S>, sink: Arc<K>) -> Self {
        Self {
            source,
            sink,
            error_policy: Arc::new(SkipErrors),
            config: ProcessorConfig::default(),
            counters: Arc::new(Counters::default()),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl<S, K, P> StreamProcessor<S, K, P>
where
    S: MessageSource + 'static,
    K: Sink + 'static,
    P: ErrorPolicy + 'static,
{
    pub fn with_config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the worker slot count (0 is raised to 1)
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.config.max_workers = max_workers.max(1);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.config.attempt_timeout = timeout;
        self
    }

    /// Replace the error policy that receives failure reports
    pub fn with_error_policy<Q>(self, error_policy: Q) -> StreamProcessor<S, K, Q>
    where
        Q: ErrorPolicy + 'static,
    {
        StreamProcessor {
            source: self.source,
            sink: self.sink,
            error_policy: Arc::new(error_policy),
            config: self.config,
            counters: self.counters,
            in_flight: self.in_flight,
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn stats(&self) -> ProcessorStats {
        self.counters.snapshot()
    }

    /// Dispatches currently holding a worker slot
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run the receive loop until `shutdown` is cancelled or the source stops
    ///
    /// On exit every in-flight dispatch is drained (each message committed)
    /// before the source is closed. Returns the result of closing the source.
    pub async fn start(&self, shutdown: CancellationToken) -> Result<(), SourceError> {
        let max_workers = self.config.max_workers.max(1);
        let slots = Arc::new(Semaphore::new(max_workers));
        let workers = TaskTracker::new();
        let dispatcher = Arc::new(Dispatcher::new(
            self.sink.clone(),
            self.config.retry,
            self.config.attempt_timeout,
            self.error_policy.clone(),
        ));

        info!(
            max_workers,
            max_attempts = self.config.retry.max_attempts(),
            "stream processor started"
        );

        loop {
            let received = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                received = self.source.receive(self.config.poll_timeout) => received,
            };

            let message = match received {
                Ok(message) => message,
                Err(e) if e.is_terminal() => {
                    info!(reason = %e, "source stopped delivering");
                    break;
                }
                Err(e) => {
                    if !matches!(e, SourceError::Empty) {
                        self.counters.receive_error();
                        self.error_policy.on_receive_error(&e);
                    }
                    tokio::select! {
                        biased;
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.config.idle_poll_interval) => continue,
                    }
                }
            };

            self.counters.received();

            // Blocks while every slot is taken; the semaphore is never closed
            let Ok(permit) = slots.clone().acquire_owned().await else {
                break;
            };
            self.in_flight.fetch_add(1, Ordering::SeqCst);

            let span = info_span!(
                "dispatch",
                partition = message.offset.partition,
                position = message.offset.position
            );
            let source = self.source.clone();
            let dispatcher = dispatcher.clone();
            let error_policy = self.error_policy.clone();
            let counters = self.counters.clone();
            let in_flight = self.in_flight.clone();
            let shutdown = shutdown.clone();

            workers.spawn(
                async move {
                    let outcome = dispatcher.dispatch(&message, &shutdown).await;
                    counters.outcome(&outcome);

                    match source.commit(&message).await {
                        Ok(()) => {
                            counters.committed();
                            debug!(attempts = outcome.attempts(), "committed message");
                        }
                        Err(e) => {
                            counters.commit_failed();
                            error_policy.on_commit_error(&message, &e);
                        }
                    }

                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    drop(permit);
                }
                .instrument(span),
            );
        }

        workers.close();
        info!(in_flight = self.in_flight(), "draining in-flight messages");
        workers.wait().await;

        let closed = self.source.close().await;
        info!(stats = ?self.stats(), "stream processor stopped");
        closed
    }
}
