use std::time::Duration;

/// Default number of store attempts per message
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default unit of linear backoff
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(300);

/// Whether another attempt may follow attempt number `attempt` (1-indexed)
pub fn should_retry(attempt: u32, max_attempts: u32) -> bool {
    attempt < max_attempts
}

/// Wait after failed attempt number `attempt`: `base_delay * attempt`
pub fn linear_backoff(attempt: u32, base_delay: Duration) -> Duration {
    base_delay.saturating_mul(attempt)
}

/// Bounded linear retry policy
///
/// Attempt 1 is followed by a wait of one `base_delay`, attempt 2 by two, and
/// so on, so the worst case for one message is
/// `base_delay * max_attempts * (max_attempts - 1) / 2` plus the attempts
/// themselves. The policy does not classify errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` of 0 is raised to 1
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        should_retry(attempt, self.max_attempts)
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        linear_backoff(attempt, self.base_delay)
    }

    /// Sum of every backoff taken when all attempts fail
    pub fn worst_case_backoff(&self) -> Duration {
        (1..self.max_attempts).map(|attempt| self.backoff(attempt)).sum()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}
