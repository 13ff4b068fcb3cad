pub mod error;
pub mod processor;
pub mod stats;

// Re-export commonly used types
pub use error::{ErrorPolicy, SilentSkip, SkipErrors};
pub use processor::{
    DEFAULT_IDLE_POLL_INTERVAL, DEFAULT_MAX_WORKERS, DEFAULT_POLL_TIMEOUT, ProcessorConfig,
    StreamProcessor,
};
pub use stats::ProcessorStats;
