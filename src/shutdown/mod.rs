pub mod coordinator;
pub mod error;
pub mod signal;
pub mod traits;

// Re-export commonly used types
pub use coordinator::{ShutdownCoordinator, ShutdownOutcome};
pub use error::ShutdownError;
pub use signal::{ShutdownSignal, wait_for_signal};
pub use traits::Shutdownable;
