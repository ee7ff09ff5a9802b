//! Injected failures for the mock worker clients.
//!
//! Each client owns a [`FailureQueue`]. Every call pops one entry; once the
//! queue is empty all calls succeed.

use parking_lot::RwLock;
use std::collections::VecDeque;

use workerlink_core::CoreError;

/// Mock worker failure pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// Worker unreachable (connection refused, timeout).
    Transport(&'static str),

    /// Worker rejected the submission (queue full, no resources).
    Admission(&'static str),

    /// Worker does not know the requested identifier.
    NotFound,

    /// Worker accepted the call but answered with a failed status.
    Internal(&'static str),

    /// Success (no error).
    Ok,
}

impl MockFailure {
    /// Converts the failure into the error a client call returns.
    ///
    /// Build worker operations map `Internal` and `NotFound` into a failed
    /// status envelope instead; see `MockBuildIndexClient`.
    pub(crate) fn into_error(
        self,
        worker: &'static str,
        entity: &'static str,
        id: impl ToString,
    ) -> Option<CoreError> {
        match self {
            MockFailure::Transport(msg) => Some(CoreError::transport(worker, msg)),
            MockFailure::Admission(msg) => Some(CoreError::admission(worker, msg)),
            MockFailure::NotFound => Some(CoreError::not_found(entity, id)),
            MockFailure::Internal(msg) => Some(CoreError::internal(msg)),
            MockFailure::Ok => None,
        }
    }
}

/// Ordered failure pattern consumed one entry per call.
#[derive(Debug, Default)]
pub struct FailureQueue {
    queue: RwLock<VecDeque<MockFailure>>,
}

impl FailureQueue {
    pub fn new(pattern: Vec<MockFailure>) -> Self {
        Self {
            queue: RwLock::new(pattern.into()),
        }
    }

    /// Pre-fills the queue with 1000 identical failures.
    pub fn always(failure: MockFailure) -> Self {
        Self::new(vec![failure; 1000])
    }

    /// Random pattern of 100 transport failures and successes.
    ///
    /// `failure_rate` is the probability of failure (0.0-1.0).
    pub fn flaky(failure_rate: f64) -> Self {
        use rand::Rng;

        let mut rng = rand::thread_rng();
        let pattern = (0..100)
            .map(|_| {
                if rng.gen::<f64>() < failure_rate {
                    MockFailure::Transport("timeout")
                } else {
                    MockFailure::Ok
                }
            })
            .collect();

        Self::new(pattern)
    }

    /// Pops the next entry. `None` means the call should succeed.
    ///
    /// An empty queue is checked under the read lock only, so concurrent
    /// callers on a mock without injected failures do not serialize here.
    pub fn next(&self) -> Option<MockFailure> {
        if self.queue.read().is_empty() {
            return None;
        }
        match self.queue.write().pop_front() {
            Some(MockFailure::Ok) | None => None,
            Some(failure) => Some(failure),
        }
    }

    /// Appends more failures to the end of the pattern.
    pub fn extend(&self, pattern: impl IntoIterator<Item = MockFailure>) {
        self.queue.write().extend(pattern);
    }

    pub fn remaining(&self) -> usize {
        self.queue.read().len()
    }
}
