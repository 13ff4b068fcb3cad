use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

use super::error::SinkError;
use super::traits::Sink;
use crate::domain::LogRecord;

/// Concurrent in-memory sink using DashMap
///
/// Records are upserted by ID, so replays are idempotent. Failures and
/// latency can be injected, and every call is instrumented (call count,
/// call start times, concurrent-call high-water mark).
pub struct MemorySink {
    records: DashMap<String, LogRecord>,
    latency: Duration,
    failures_remaining: AtomicU32,
    always_fail: AtomicBool,
    calls: AtomicUsize,
    active: AtomicUsize,
    high_water: AtomicUsize,
    call_times: Mutex<Vec<Instant>>,
}

impl MemorySink {
    /// Create a new empty sink that always succeeds immediately
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            latency: Duration::ZERO,
            failures_remaining: AtomicU32::new(0),
            always_fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
            call_times: Mutex::new(Vec::new()),
        }
    }

    /// Delay every store call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail the next `count` store calls
    pub fn fail_next(&self, count: u32) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Fail every store call until turned off
    pub fn set_always_fail(&self, enabled: bool) {
        self.always_fail.store(enabled, Ordering::SeqCst);
    }

    /// Total store calls, including failed and timed-out ones
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Store calls currently running
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of store calls that ran at the same time
    pub fn high_water_mark(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    /// Start instant of every store call, in call order
    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<LogRecord> {
        self.records.get(id).map(|r| r.value().clone())
    }

    /// Write every stored record as one JSON document per line, ordered by ID
    pub async fn snapshot<W>(&self, mut writer: W) -> Result<(), SinkError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        // Collect first so no shard lock is held across an await
        let mut records: Vec<LogRecord> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));

        for record in &records {
            let mut line = serde_json::to_vec(record)?;
            line.push(b'\n');
            writer.write_all(&line).await?;
        }

        writer.flush().await?;
        Ok(())
    }

    fn should_fail(&self) -> bool {
        self.always_fail.load(Ordering::SeqCst)
            || self
                .failures_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the active-call gauge even when the call is cancelled
struct ActiveCall<'a>(&'a AtomicUsize);

impl Drop for ActiveCall<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn store(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Instant::now());

        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let _active = ActiveCall(&self.active);
        self.high_water.fetch_max(now_active, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.should_fail() {
            return Err(SinkError::Unavailable(format!(
                "injected failure storing {}",
                record.id
            )));
        }

        self.records.insert(record.id.clone(), record.clone());
        Ok(())
    }
}
