use parking_lot::RwLock;
use std::collections::VecDeque;
use std::time::Instant;

/// Entries kept before the oldest are evicted.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10_000;

/// Mock call history entry.
#[derive(Debug, Clone)]
pub struct CallHistoryEntry {
    /// Operation name, e.g. "flush_segment", "get_index_states".
    pub operation: &'static str,

    /// Identifier the call targeted (segment id, index ids).
    pub target: String,

    /// Whether the call succeeded.
    pub success: bool,

    /// Clock reading when the call was made.
    pub timestamp: Instant,
}

/// Bounded record of the most recent calls made against a mock client.
///
/// Once `capacity` entries are held, each new call evicts the oldest, so a
/// long-running mock on real time keeps constant memory.
#[derive(Debug)]
pub struct CallHistory {
    entries: RwLock<VecDeque<CallHistoryEntry>>,
    capacity: usize,
}

impl CallHistory {
    /// A capacity of zero disables recording.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            capacity,
        }
    }

    pub fn disabled() -> Self {
        Self::new(0)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&self, operation: &'static str, target: String, success: bool, at: Instant) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.write();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(CallHistoryEntry {
            operation,
            target,
            success,
            timestamp: at,
        });
    }

    /// Retained entries, oldest first.
    pub fn entries(&self) -> Vec<CallHistoryEntry> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Number of successful calls to `operation`.
    pub fn successes(&self, operation: &str) -> usize {
        self.count(operation, true)
    }

    /// Number of failed calls to `operation`.
    pub fn failures(&self, operation: &str) -> usize {
        self.count(operation, false)
    }

    fn count(&self, operation: &str, success: bool) -> usize {
        self.entries
            .read()
            .iter()
            .filter(|entry| entry.operation == operation && entry.success == success)
            .count()
    }
}

impl Default for CallHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
