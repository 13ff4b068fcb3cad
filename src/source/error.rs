use std::io;
use thiserror::Error;

use crate::domain::Offset;

/// Errors surfaced by message sources
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("No message available")]
    Empty,

    #[error("Source exhausted")]
    Exhausted,

    #[error("Source closed")]
    Closed,

    #[error("Receive failed: {0}")]
    Receive(String),

    #[error("Commit failed at {offset}: {reason}")]
    Commit { offset: Offset, reason: String },

    #[error("Message already committed: {0}")]
    AlreadyCommitted(Offset),

    #[error("Close failed: {0}")]
    Close(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SourceError {
    /// The source will not deliver any further messages
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted | Self::Closed)
    }
}
