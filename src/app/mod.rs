pub mod cli;
pub mod error;

// Re-export commonly used types
pub use cli::{AppContext, CliApp, Completion, DEFAULT_LOG_FILTER, exit_code};
pub use error::AppError;
