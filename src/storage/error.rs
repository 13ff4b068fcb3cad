use std::io;
use std::time::Duration;
use thiserror::Error;

/// Sink-level errors; every one of them is retried by the dispatcher
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    #[error("Sink rejected record {id}: {reason}")]
    Rejected { id: String, reason: String },

    #[error("Store attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
