pub mod dispatcher;
pub mod retry;

// Re-export commonly used types
pub use dispatcher::{DEFAULT_ATTEMPT_TIMEOUT, DispatchOutcome, Dispatcher};
pub use retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, RetryPolicy, linear_backoff, should_retry};
