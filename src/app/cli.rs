use std::future::Future;

use tokio::io::{BufWriter, Stdout};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use super::error::AppError;
use crate::config::AppConfig;
use crate::shutdown::ShutdownSignal;

/// Default `tracing` filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Everything the main function needs from the runner
pub struct AppContext {
    pub config: AppConfig,
    /// Buffered stdout; diagnostics go to stderr so stdout stays clean
    pub stdout: BufWriter<Stdout>,
}

/// How the main function finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Input ran out and everything was drained
    Finished,
    /// A termination signal stopped processing early
    Interrupted(ShutdownSignal),
}

impl Completion {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Finished => 0,
            Self::Interrupted(signal) => signal.exit_code(),
        }
    }
}

/// Exit code for the result of a run: 0 on success, 1 on error, 128+N on signal
pub fn exit_code(result: &Result<Completion, AppError>) -> i32 {
    match result {
        Ok(completion) => completion.exit_code(),
        Err(_) => 1,
    }
}

/// Reusable CLI application runner that handles:
/// - Logging setup (stderr, `RUST_LOG` filter)
/// - Argument parsing and configuration loading
/// - Stdout buffering
/// - Exit codes (0 = success, 1 = error, 130 = SIGINT, 143 = SIGTERM)
pub struct CliApp {
    name: String,
    log_filter: String,
}

impl CliApp {
    /// Create a new CLI application runner
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    /// Filter used when `RUST_LOG` is unset
    pub fn with_log_filter(mut self, filter: &str) -> Self {
        self.log_filter = filter.to_string();
        self
    }

    /// Install the stderr subscriber; a no-op if one is already installed
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_filter));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Run the application and return the process exit code
    ///
    /// Parses the command line with `parse_args`, loads [`AppConfig`] from the
    /// environment, and hands both to `main_fn` together with a buffered
    /// stdout writer. Errors are logged and mapped to exit code 1.
    pub async fn run<A, P, F, Fut>(self, parse_args: P, main_fn: F) -> i32
    where
        P: FnOnce(Vec<String>) -> Result<A, AppError>,
        F: FnOnce(AppContext, A) -> Fut,
        Fut: Future<Output = Result<Completion, AppError>>,
    {
        self.init_tracing();

        let result = async {
            let args = parse_args(std::env::args().collect())?;
            let config = AppConfig::from_env()?;
            info!(app = %self.name, ?config, "starting");

            let context = AppContext {
                config,
                stdout: BufWriter::new(tokio::io::stdout()),
            };
            main_fn(context, args).await
        }
        .await;

        match &result {
            Ok(completion) => info!(app = %self.name, ?completion, "exiting"),
            Err(e) => error!(app = %self.name, error = %e, "fatal error"),
        }
        exit_code(&result)
    }
}
