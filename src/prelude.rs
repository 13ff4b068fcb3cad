//! Prelude module for convenient imports
//!
//! Import everything you need with: `use logstream::prelude::*;`

// Domain types
pub use crate::domain::{LogRecord, Offset, RawMessage, ValidationError, normalize};

// Source types
pub use crate::source::{
    CloseOnce, LineSource, MemorySource, MessageSource, SourceError, StreamSource,
};

// Storage types
pub use crate::storage::{MemorySink, Sink, SinkError};

// Engine types
pub use crate::engine::{DispatchOutcome, Dispatcher, RetryPolicy};

// Streaming types
pub use crate::streaming::{
    ErrorPolicy, ProcessorConfig, ProcessorStats, SilentSkip, SkipErrors, StreamProcessor,
};

// Shutdown types
pub use crate::shutdown::{
    ShutdownCoordinator, ShutdownError, ShutdownOutcome, ShutdownSignal, Shutdownable,
};

// Config and app types
pub use crate::app::{AppContext, AppError, CliApp, Completion};
pub use crate::config::{AppConfig, ConfigError};
