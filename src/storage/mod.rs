pub mod error;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use error::SinkError;
pub use memory::MemorySink;
pub use traits::Sink;
