pub mod close_once;
pub mod error;
pub mod line;
pub mod memory;
pub mod stream;
pub mod traits;

// Re-export commonly used types
pub use close_once::CloseOnce;
pub use error::SourceError;
pub use line::{LineSource, source_name};
pub use memory::MemorySource;
pub use stream::StreamSource;
pub use traits::MessageSource;
