use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::error::ShutdownError;
use super::signal::{ShutdownSignal, wait_for_signal};
use super::traits::Shutdownable;

/// Default grace period for closing registered resources
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// How a shutdown finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every resource closed within the timeout
    Clean,
    /// The timeout elapsed first; remaining closes were abandoned
    Forced,
}

/// Turns a termination request into cancellation plus resource release
///
/// The coordinator is the only owner of the root cancellation token.
/// Consumers get child tokens from [`ShutdownCoordinator::token`], so they can
/// observe the shutdown but cannot trigger it for everyone else.
pub struct ShutdownCoordinator {
    token: CancellationToken,
    resources: Vec<Arc<dyn Shutdownable>>,
    timeout: Duration,
}

impl ShutdownCoordinator {
    /// Create a coordinator with the given close timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            resources: Vec::new(),
            timeout,
        }
    }

    /// Register a resource to close on shutdown (closed in registration order)
    pub fn register(&mut self, resource: Arc<dyn Shutdownable>) {
        self.resources.push(resource);
    }

    /// Register a resource (fluent interface)
    pub fn with_resource(mut self, resource: Arc<dyn Shutdownable>) -> Self {
        self.register(resource);
        self
    }

    /// Token cancelled when shutdown begins
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Cancel the shared token, then close every resource racing the timeout
    ///
    /// Close errors are logged and never retried.
    pub async fn shutdown(&self) -> ShutdownOutcome {
        info!(resources = self.resources.len(), "graceful shutdown triggered");
        self.token.cancel();

        let close_all = async {
            for resource in &self.resources {
                if let Err(e) = resource.shutdown().await {
                    error!(resource = resource.name(), error = %e, "error closing resource");
                }
            }
        };

        match tokio::time::timeout(self.timeout, close_all).await {
            Ok(()) => {
                info!("all resources closed");
                ShutdownOutcome::Clean
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "shutdown timeout reached, forcing shutdown"
                );
                ShutdownOutcome::Forced
            }
        }
    }

    /// Wait for `trigger` to resolve, then shut down
    pub async fn shutdown_on<F>(&self, trigger: F) -> ShutdownOutcome
    where
        F: Future<Output = ()>,
    {
        trigger.await;
        self.shutdown().await
    }

    /// Wait for an OS termination signal, then shut down
    pub async fn run_until_signal(&self) -> Result<(ShutdownSignal, ShutdownOutcome), ShutdownError> {
        let signal = wait_for_signal().await?;
        info!(?signal, "received termination signal");
        Ok((signal, self.shutdown().await))
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_SHUTDOWN_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Resource that takes `delay` to close and counts its closes
    struct SlowResource {
        name: &'static str,
        delay: Duration,
        fail: bool,
        closes: AtomicUsize,
    }

    impl SlowResource {
        fn new(name: &'static str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                name,
                delay,
                fail: false,
                closes: AtomicUsize::new(0),
            })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                delay: Duration::ZERO,
                fail: true,
                closes: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Shutdownable for SlowResource {
        fn name(&self) -> &str {
            self.name
        }

        async fn shutdown(&self) -> Result<(), ShutdownError> {
            tokio::time::sleep(self.delay).await;
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ShutdownError::Close {
                    resource: self.name.to_string(),
                    reason: "refused".to_string(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn clean_shutdown_closes_everything() {
        let a = SlowResource::new("a", Duration::from_millis(10));
        let b = SlowResource::new("b", Duration::from_millis(10));
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(1))
            .with_resource(a.clone())
            .with_resource(b.clone());
        let token = coordinator.token();

        let outcome = coordinator.shutdown().await;

        assert_eq!(outcome, ShutdownOutcome::Clean);
        assert!(token.is_cancelled());
        assert_eq!(a.closes.load(Ordering::SeqCst), 1);
        assert_eq!(b.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_resource_forces_shutdown() {
        let slow = SlowResource::new("slow", Duration::from_secs(60));
        let coordinator =
            ShutdownCoordinator::new(Duration::from_millis(100)).with_resource(slow.clone());
        let token = coordinator.token();

        let outcome = coordinator.shutdown().await;

        assert_eq!(outcome, ShutdownOutcome::Forced);
        assert!(token.is_cancelled());
        assert_eq!(slow.closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn close_errors_do_not_stop_other_closes() {
        let broken = SlowResource::failing("broken");
        let fine = SlowResource::new("fine", Duration::ZERO);
        let coordinator = ShutdownCoordinator::default()
            .with_resource(broken.clone())
            .with_resource(fine.clone());

        assert_eq!(coordinator.shutdown().await, ShutdownOutcome::Clean);
        assert_eq!(broken.closes.load(Ordering::SeqCst), 1);
        assert_eq!(fine.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn token_cancelled_before_resources_close() {
        let coordinator = ShutdownCoordinator::default();
        let token = coordinator.token();
        assert!(!coordinator.is_shutting_down());

        coordinator.shutdown_on(async {}).await;

        assert!(coordinator.is_shutting_down());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn child_token_cannot_cancel_root() {
        let coordinator = ShutdownCoordinator::default();
        coordinator.token().cancel();
        assert!(!coordinator.is_shutting_down());
    }
}
