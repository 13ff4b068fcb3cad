use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::error::SourceError;
use super::traits::MessageSource;
use crate::domain::{Offset, RawMessage};

/// How long an empty, non-exhausting source waits before reporting `Empty`
const IDLE_DELAY: Duration = Duration::from_millis(5);

/// Scripted receive outcome
enum Step {
    Message(RawMessage),
    Fail(SourceError),
    Empty,
}

/// In-memory message source with scripted receive and commit outcomes
///
/// Messages get sequential offsets on partition 0 in push order. Once the
/// script runs dry the source either keeps reporting `Empty` (like a live
/// topic) or reports `Exhausted` when built with [`MemorySource::exhausting`].
pub struct MemorySource {
    queue: Mutex<VecDeque<Step>>,
    next_position: AtomicI64,
    exhaust_when_drained: bool,
    commit_failures: AtomicUsize,
    committed: Mutex<Vec<Offset>>,
    commit_calls: AtomicUsize,
    close_calls: AtomicUsize,
    closed: AtomicBool,
    fail_close: AtomicBool,
}

impl MemorySource {
    /// Create an empty source that never exhausts
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            next_position: AtomicI64::new(0),
            exhaust_when_drained: false,
            commit_failures: AtomicUsize::new(0),
            committed: Mutex::new(Vec::new()),
            commit_calls: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            fail_close: AtomicBool::new(false),
        }
    }

    /// Report `Exhausted` once every scripted step has been consumed
    pub fn exhausting(mut self) -> Self {
        self.exhaust_when_drained = true;
        self
    }

    /// Queue a batch of key/value messages
    pub fn with_messages<K, V, I>(self, messages: I) -> Self
    where
        K: Into<Vec<u8>>,
        V: Into<Vec<u8>>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in messages {
            self.push(key, value);
        }
        self
    }

    /// Queue one message and return the offset it was given
    pub fn push(&self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Offset {
        let offset = Offset::new(0, self.next_position.fetch_add(1, Ordering::SeqCst));
        self.queue()
            .push_back(Step::Message(RawMessage::new(key, value, offset)));
        offset
    }

    /// Queue a receive failure
    pub fn push_error(&self, error: SourceError) {
        self.queue().push_back(Step::Fail(error));
    }

    /// Queue one empty read
    pub fn push_empty(&self) {
        self.queue().push_back(Step::Empty);
    }

    /// Make the next `count` commits fail without recording them
    pub fn fail_next_commits(&self, count: usize) {
        self.commit_failures.store(count, Ordering::SeqCst);
    }

    /// Make `close` report an error (the source still stops delivering)
    pub fn fail_close(&self) {
        self.fail_close.store(true, Ordering::SeqCst);
    }

    /// Offsets committed successfully, in commit order
    pub fn committed(&self) -> Vec<Offset> {
        lock(&self.committed).clone()
    }

    /// Number of commit calls, successful or not
    pub fn commit_calls(&self) -> usize {
        self.commit_calls.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Scripted steps not yet consumed
    pub fn pending(&self) -> usize {
        self.queue().len()
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Step>> {
        lock(&self.queue)
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl MessageSource for MemorySource {
    async fn receive(&self, timeout: Duration) -> Result<RawMessage, SourceError> {
        if self.is_closed() {
            return Err(SourceError::Closed);
        }

        let step = self.queue().pop_front();
        match step {
            Some(Step::Message(message)) => Ok(message),
            Some(Step::Fail(error)) => Err(error),
            Some(Step::Empty) => Err(SourceError::Empty),
            None if self.exhaust_when_drained => Err(SourceError::Exhausted),
            None => {
                tokio::time::sleep(IDLE_DELAY.min(timeout)).await;
                Err(SourceError::Empty)
            }
        }
    }

    async fn commit(&self, message: &RawMessage) -> Result<(), SourceError> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);

        if self
            .commit_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(SourceError::Commit {
                offset: message.offset,
                reason: "scripted commit failure".to_string(),
            });
        }

        let mut committed = lock(&self.committed);
        if committed.contains(&message.offset) {
            return Err(SourceError::AlreadyCommitted(message.offset));
        }
        committed.push(message.offset);
        Ok(())
    }

    async fn close(&self) -> Result<(), SourceError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(SourceError::Close("scripted close failure".to_string()));
        }
        Ok(())
    }
}
