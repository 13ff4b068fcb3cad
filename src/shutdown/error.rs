use std::io;
use thiserror::Error;

/// Errors raised while shutting resources down
#[derive(Error, Debug)]
pub enum ShutdownError {
    #[error("Failed to close {resource}: {reason}")]
    Close { resource: String, reason: String },

    #[error("Signal handler error: {0}")]
    Signal(#[from] io::Error),
}
