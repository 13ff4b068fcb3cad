//! Runtime configuration loaded from the environment

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::engine::RetryPolicy;
use crate::streaming::{DEFAULT_MAX_WORKERS, ProcessorConfig};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default store attempts per message.
pub const DEFAULT_MAX_CONSUME_RETRIES: u32 = 3;

/// Default linear backoff unit in milliseconds.
pub const DEFAULT_BACKOFF_MS: u64 = 300;

/// Default deadline for one store attempt in milliseconds.
pub const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 5_000;

/// Default time allowed for closing resources in milliseconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5_000;

/// Default deadline for one receive call in milliseconds.
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 500;

/// Default pause after an empty read in milliseconds.
pub const DEFAULT_IDLE_POLL_MS: u64 = 10;

pub const ENV_MAX_WORKERS: &str = "LOGSTREAM_MAX_WORKERS";
pub const ENV_MAX_CONSUME_RETRIES: &str = "LOGSTREAM_MAX_CONSUME_RETRIES";
pub const ENV_BACKOFF_MS: &str = "LOGSTREAM_BACKOFF_MS";
pub const ENV_ATTEMPT_TIMEOUT_MS: &str = "LOGSTREAM_ATTEMPT_TIMEOUT_MS";
pub const ENV_SHUTDOWN_TIMEOUT_MS: &str = "LOGSTREAM_SHUTDOWN_TIMEOUT_MS";
pub const ENV_POLL_TIMEOUT_MS: &str = "LOGSTREAM_POLL_TIMEOUT_MS";
pub const ENV_IDLE_POLL_MS: &str = "LOGSTREAM_IDLE_POLL_MS";

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },

    #[error("{key} out of range: {reason}")]
    OutOfRange { key: String, reason: String },
}

/// Processor and shutdown settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub max_workers: usize,
    pub max_consume_retries: u32,
    pub backoff_ms: u64,
    pub attempt_timeout_ms: u64,
    pub shutdown_timeout_ms: u64,
    pub poll_timeout_ms: u64,
    pub idle_poll_ms: u64,
}

impl AppConfig {
    /// Load configuration from the process environment (and `.env` if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unset keys fall back to their defaults; set but unparseable keys are
    /// an error rather than silently defaulted.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            max_workers: parse_or(&lookup, ENV_MAX_WORKERS, DEFAULT_MAX_WORKERS)?,
            max_consume_retries: parse_or(
                &lookup,
                ENV_MAX_CONSUME_RETRIES,
                DEFAULT_MAX_CONSUME_RETRIES,
            )?,
            backoff_ms: parse_or(&lookup, ENV_BACKOFF_MS, DEFAULT_BACKOFF_MS)?,
            attempt_timeout_ms: parse_or(
                &lookup,
                ENV_ATTEMPT_TIMEOUT_MS,
                DEFAULT_ATTEMPT_TIMEOUT_MS,
            )?,
            shutdown_timeout_ms: parse_or(
                &lookup,
                ENV_SHUTDOWN_TIMEOUT_MS,
                DEFAULT_SHUTDOWN_TIMEOUT_MS,
            )?,
            poll_timeout_ms: parse_or(&lookup, ENV_POLL_TIMEOUT_MS, DEFAULT_POLL_TIMEOUT_MS)?,
            idle_poll_ms: parse_or(&lookup, ENV_IDLE_POLL_MS, DEFAULT_IDLE_POLL_MS)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(out_of_range(ENV_MAX_WORKERS, "must be greater than 0"));
        }

        if self.max_consume_retries == 0 {
            return Err(out_of_range(ENV_MAX_CONSUME_RETRIES, "must be greater than 0"));
        }

        if self.attempt_timeout_ms == 0 {
            return Err(out_of_range(ENV_ATTEMPT_TIMEOUT_MS, "must be greater than 0"));
        }

        if self.poll_timeout_ms == 0 {
            return Err(out_of_range(ENV_POLL_TIMEOUT_MS, "must be greater than 0"));
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_consume_retries, Duration::from_millis(self.backoff_ms))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Settings for the stream processor
    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            max_workers: self.max_workers,
            retry: self.retry_policy(),
            attempt_timeout: Duration::from_millis(self.attempt_timeout_ms),
            poll_timeout: Duration::from_millis(self.poll_timeout_ms),
            idle_poll_interval: Duration::from_millis(self.idle_poll_ms),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            max_consume_retries: DEFAULT_MAX_CONSUME_RETRIES,
            backoff_ms: DEFAULT_BACKOFF_MS,
            attempt_timeout_ms: DEFAULT_ATTEMPT_TIMEOUT_MS,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            idle_poll_ms: DEFAULT_IDLE_POLL_MS,
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value: raw,
        }),
    }
}

fn out_of_range(key: &str, reason: &str) -> ConfigError {
    ConfigError::OutOfRange {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
