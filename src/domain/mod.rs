pub mod error;
pub mod message;
pub mod normalize;
pub mod record;

// Re-export commonly used types
pub use error::ValidationError;
pub use message::{Offset, RawMessage};
pub use normalize::normalize;
pub use record::LogRecord;
