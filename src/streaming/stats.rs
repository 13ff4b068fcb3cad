use std::sync::atomic::{AtomicU64, Ordering};

use crate::engine::DispatchOutcome;

/// Point-in-time view of processor counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorStats {
    pub received: u64,
    pub stored: u64,
    pub rejected: u64,
    pub exhausted: u64,
    pub interrupted: u64,
    pub committed: u64,
    pub commit_failures: u64,
    pub receive_errors: u64,
}

impl ProcessorStats {
    /// Messages that reached a terminal outcome
    pub fn finished(&self) -> u64 {
        self.stored + self.rejected + self.exhausted + self.interrupted
    }
}

/// Shared counters updated by the receive loop and workers
#[derive(Debug, Default)]
pub(crate) struct Counters {
    received: AtomicU64,
    stored: AtomicU64,
    rejected: AtomicU64,
    exhausted: AtomicU64,
    interrupted: AtomicU64,
    committed: AtomicU64,
    commit_failures: AtomicU64,
    receive_errors: AtomicU64,
}

impl Counters {
    pub(crate) fn received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn receive_error(&self) {
        self.receive_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn outcome(&self, outcome: &DispatchOutcome) {
        let counter = match outcome {
            DispatchOutcome::Stored { .. } => &self.stored,
            DispatchOutcome::Rejected(_) => &self.rejected,
            DispatchOutcome::Exhausted { .. } => &self.exhausted,
            DispatchOutcome::Interrupted { .. } => &self.interrupted,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn committed(&self) {
        self.committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn commit_failed(&self) {
        self.commit_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ProcessorStats {
        ProcessorStats {
            received: self.received.load(Ordering::Relaxed),
            stored: self.stored.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            interrupted: self.interrupted.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            commit_failures: self.commit_failures.load(Ordering::Relaxed),
            receive_errors: self.receive_errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationError;
    use crate::storage::SinkError;

    #[test]
    fn outcomes_land_in_their_counters() {
        let counters = Counters::default();
        counters.received();
        counters.outcome(&DispatchOutcome::Stored { attempts: 1 });
        counters.outcome(&DispatchOutcome::Rejected(ValidationError::EmptyId));
        counters.outcome(&DispatchOutcome::Exhausted {
            attempts: 3,
            last_error: SinkError::Unavailable("down".to_string()),
        });
        counters.committed();
        counters.commit_failed();

        let stats = counters.snapshot();
        assert_eq!(stats.received, 1);
        assert_eq!(stats.stored, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.exhausted, 1);
        assert_eq!(stats.interrupted, 0);
        assert_eq!(stats.committed, 1);
        assert_eq!(stats.commit_failures, 1);
        assert_eq!(stats.finished(), 3);
    }
}
