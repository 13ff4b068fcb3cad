use tracing::{error, warn};

use crate::domain::{LogRecord, RawMessage, ValidationError};
use crate::source::SourceError;
use crate::storage::SinkError;

/// Side channel for failures observed while processing a stream
///
/// Reports never change control flow: the processor keeps receiving, every
/// received message is still committed, and only cancellation or an
/// exhausted source stops the loop.
pub trait ErrorPolicy: Send + Sync {
    /// A receive failed for a reason other than an empty or closed source
    fn on_receive_error(&self, error: &SourceError);

    /// A message failed validation and will be committed without storing
    fn on_rejected(&self, message: &RawMessage, error: &ValidationError);

    /// One store attempt failed (it may still be retried)
    fn on_attempt_failed(&self, record: &LogRecord, attempt: u32, error: &SinkError);

    /// Every allowed attempt failed; the message will be committed anyway
    fn on_exhausted(&self, record: &LogRecord, attempts: u32, error: &SinkError);

    /// Shutdown began between attempts; no further attempts are made
    fn on_interrupted(&self, record: &LogRecord, attempts: u32, error: &SinkError);

    /// Acknowledging a message failed; it may be redelivered after restart
    fn on_commit_error(&self, message: &RawMessage, error: &SourceError);
}

/// Log failures through `tracing` and keep going
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipErrors;

impl ErrorPolicy for SkipErrors {
    fn on_receive_error(&self, error: &SourceError) {
        warn!(error = %error, "error reading message");
    }

    fn on_rejected(&self, message: &RawMessage, error: &ValidationError) {
        warn!(offset = %message.offset, error = %error, "rejected invalid message");
    }

    fn on_attempt_failed(&self, record: &LogRecord, attempt: u32, error: &SinkError) {
        warn!(id = %record.id, attempt, error = %error, "error storing log");
    }

    fn on_exhausted(&self, record: &LogRecord, attempts: u32, error: &SinkError) {
        error!(id = %record.id, attempts, error = %error, "giving up on log after retries");
    }

    fn on_interrupted(&self, record: &LogRecord, attempts: u32, error: &SinkError) {
        warn!(id = %record.id, attempts, error = %error, "shutdown interrupted retries");
    }

    fn on_commit_error(&self, message: &RawMessage, error: &SourceError) {
        error!(offset = %message.offset, error = %error, "error committing message");
    }
}

/// Silent error policy - drop every report
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSkip;

impl ErrorPolicy for SilentSkip {
    fn on_receive_error(&self, _error: &SourceError) {}

    fn on_rejected(&self, _message: &RawMessage, _error: &ValidationError) {}

    fn on_attempt_failed(&self, _record: &LogRecord, _attempt: u32, _error: &SinkError) {}

    fn on_exhausted(&self, _record: &LogRecord, _attempts: u32, _error: &SinkError) {}

    fn on_interrupted(&self, _record: &LogRecord, _attempts: u32, _error: &SinkError) {}

    fn on_commit_error(&self, _message: &RawMessage, _error: &SourceError) {}
}
