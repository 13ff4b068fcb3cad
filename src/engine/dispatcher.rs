use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::retry::RetryPolicy;
use crate::domain::{RawMessage, ValidationError, normalize};
use crate::storage::{Sink, SinkError};
use crate::streaming::ErrorPolicy;

/// Default deadline for a single store attempt
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Terminal outcome of dispatching one message
///
/// Every outcome is followed by a commit.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The sink accepted the record
    Stored { attempts: u32 },
    /// The message never reached the sink
    Rejected(ValidationError),
    /// Every allowed attempt failed
    Exhausted { attempts: u32, last_error: SinkError },
    /// Shutdown began before the next attempt could start
    Interrupted { attempts: u32, last_error: SinkError },
}

impl DispatchOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }

    /// Store attempts made for the message
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Stored { attempts }
            | Self::Exhausted { attempts, .. }
            | Self::Interrupted { attempts, .. } => *attempts,
            Self::Rejected(_) => 0,
        }
    }
}

/// Normalizes one message and stores it under the retry policy
pub struct Dispatcher<K, P>
where
    K: Sink,
    P: ErrorPolicy,
{
    sink: Arc<K>,
    retry: RetryPolicy,
    attempt_timeout: Duration,
    policy: Arc<P>,
}

impl<K, P> Dispatcher<K, P>
where
    K: Sink,
    P: ErrorPolicy,
{
    pub fn new(sink: Arc<K>, retry: RetryPolicy, attempt_timeout: Duration, policy: Arc<P>) -> Self {
        Self {
            sink,
            retry,
            attempt_timeout,
            policy,
        }
    }

    /// Drive one message to its terminal outcome
    ///
    /// Each attempt is bounded by the attempt timeout; an attempt that times
    /// out counts as failed. Once `shutdown` is cancelled no new attempt
    /// starts, but an attempt already running is left to finish or time out.
    pub async fn dispatch(&self, message: &RawMessage, shutdown: &CancellationToken) -> DispatchOutcome {
        let record = match normalize(message) {
            Ok(record) => record,
            Err(e) => {
                self.policy.on_rejected(message, &e);
                return DispatchOutcome::Rejected(e);
            }
        };

        let mut attempt = 1;
        loop {
            let result = tokio::time::timeout(self.attempt_timeout, self.sink.store(&record)).await;
            let error = match result {
                Ok(Ok(())) => {
                    debug!(id = %record.id, attempt, "stored log");
                    return DispatchOutcome::Stored { attempts: attempt };
                }
                Ok(Err(e)) => e,
                Err(_) => SinkError::Timeout(self.attempt_timeout),
            };

            self.policy.on_attempt_failed(&record, attempt, &error);

            if !self.retry.should_retry(attempt) {
                self.policy.on_exhausted(&record, attempt, &error);
                return DispatchOutcome::Exhausted {
                    attempts: attempt,
                    last_error: error,
                };
            }

            let interrupted = tokio::select! {
                biased;
                _ = shutdown.cancelled() => true,
                _ = tokio::time::sleep(self.retry.backoff(attempt)) => false,
            };
            if interrupted {
                self.policy.on_interrupted(&record, attempt, &error);
                return DispatchOutcome::Interrupted {
                    attempts: attempt,
                    last_error: error,
                };
            }

            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Offset;
    use crate::storage::MemorySink;
    use crate::streaming::SilentSkip;

    fn dispatcher(sink: Arc<MemorySink>, max_attempts: u32) -> Dispatcher<MemorySink, SilentSkip> {
        Dispatcher::new(
            sink,
            RetryPolicy::new(max_attempts, Duration::from_millis(100)),
            Duration::from_millis(500),
            Arc::new(SilentSkip),
        )
    }

    fn message(key: &str, value: &str) -> RawMessage {
        RawMessage::new(key, value, Offset::new(0, 0))
    }

    #[tokio::test]
    async fn stores_on_first_attempt() {
        let sink = Arc::new(MemorySink::new());
        let outcome = dispatcher(sink.clone(), 3)
            .dispatch(&message("1", "msg1"), &CancellationToken::new())
            .await;

        assert!(matches!(outcome, DispatchOutcome::Stored { attempts: 1 }));
        assert_eq!(sink.get("1").unwrap().message, "msg1");
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_sink_recovers() {
        let sink = Arc::new(MemorySink::new());
        sink.fail_next(2);

        let outcome = dispatcher(sink.clone(), 3)
            .dispatch(&message("1", "msg1"), &CancellationToken::new())
            .await;

        assert!(matches!(outcome, DispatchOutcome::Stored { attempts: 3 }));
        assert_eq!(sink.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let sink = Arc::new(MemorySink::new());
        sink.set_always_fail(true);

        let outcome = dispatcher(sink.clone(), 3)
            .dispatch(&message("1", "msg1"), &CancellationToken::new())
            .await;

        assert!(matches!(
            outcome,
            DispatchOutcome::Exhausted {
                attempts: 3,
                last_error: SinkError::Unavailable(_)
            }
        ));
        assert_eq!(sink.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn no_backoff_after_final_attempt() {
        let sink = Arc::new(MemorySink::new());
        sink.set_always_fail(true);
        let start = tokio::time::Instant::now();

        dispatcher(sink, 3)
            .dispatch(&message("1", "msg1"), &CancellationToken::new())
            .await;

        // 100ms after attempt 1 and 200ms after attempt 2 only
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn invalid_message_never_reaches_sink() {
        let sink = Arc::new(MemorySink::new());
        let d = dispatcher(sink.clone(), 3);
        let token = CancellationToken::new();

        let empty_key = d.dispatch(&message("", "msg"), &token).await;
        let empty_value = d.dispatch(&message("1", ""), &token).await;

        assert!(matches!(
            empty_key,
            DispatchOutcome::Rejected(ValidationError::EmptyId)
        ));
        assert!(matches!(
            empty_value,
            DispatchOutcome::Rejected(ValidationError::EmptyMessage)
        ));
        assert_eq!(empty_key.attempts(), 0);
        assert_eq!(sink.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_store_counts_as_failed_attempt() {
        let sink = Arc::new(MemorySink::new().with_latency(Duration::from_secs(60)));

        let outcome = dispatcher(sink.clone(), 2)
            .dispatch(&message("1", "msg1"), &CancellationToken::new())
            .await;

        assert!(matches!(
            outcome,
            DispatchOutcome::Exhausted {
                attempts: 2,
                last_error: SinkError::Timeout(_)
            }
        ));
        assert_eq!(sink.active(), 0);
        assert!(sink.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_further_attempts() {
        let sink = Arc::new(MemorySink::new());
        sink.set_always_fail(true);
        let token = CancellationToken::new();
        token.cancel();

        let outcome = dispatcher(sink.clone(), 5)
            .dispatch(&message("1", "msg1"), &token)
            .await;

        // The first attempt still runs; no retry follows it
        assert!(matches!(
            outcome,
            DispatchOutcome::Interrupted { attempts: 1, .. }
        ));
        assert_eq!(sink.calls(), 1);
    }

    #[tokio::test]
    async fn cancellation_does_not_block_successful_attempt() {
        let sink = Arc::new(MemorySink::new());
        let token = CancellationToken::new();
        token.cancel();

        let outcome = dispatcher(sink.clone(), 3)
            .dispatch(&message("1", "msg1"), &token)
            .await;

        assert!(outcome.is_stored());
    }
}
