use async_trait::async_trait;

use super::error::ShutdownError;

/// A resource the shutdown coordinator can release
#[async_trait]
pub trait Shutdownable: Send + Sync {
    /// Name used in shutdown logs
    fn name(&self) -> &str {
        "resource"
    }

    /// Release the resource; must tolerate being called more than once
    async fn shutdown(&self) -> Result<(), ShutdownError>;
}
