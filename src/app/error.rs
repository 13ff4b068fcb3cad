use std::io;
use thiserror::Error;

use crate::config::ConfigError;
use crate::shutdown::ShutdownError;
use crate::source::SourceError;
use crate::storage::SinkError;

/// Top-level application errors unifying all layer errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Shutdown error: {0}")]
    Shutdown(#[from] ShutdownError),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}
