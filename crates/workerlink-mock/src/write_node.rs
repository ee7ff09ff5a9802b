//! Mock write node client
//!
//! Simulates a data-write worker that persists and seals segments. A flush is
//! accepted immediately; the segment reports closed once the configured
//! maturation interval has elapsed on the client's clock. State is derived on
//! read, nothing runs in the background. A segment described before any flush
//! reports closed, as if flushed at the Unix epoch.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use workerlink_core::{
//!     CollectionId, ManualClock, SegmentId, Timestamp, WriteNodeClient, WriteNodeConfig,
//! };
//! use workerlink_mock::MockWriteNodeClient;
//!
//! # async fn example() -> workerlink_core::CoreResult<()> {
//! let clock = Arc::new(ManualClock::new());
//! let client = MockWriteNodeClient::new_with_config(WriteNodeConfig::default(), clock.clone());
//!
//! let segment = SegmentId::new(42);
//! client
//!     .flush_segment(segment, CollectionId::new(1), "p0", Timestamp::new(100))
//!     .await?;
//! assert!(!client.describe_segment(segment).await?.is_closed);
//!
//! clock.advance(Duration::from_secs(2));
//! assert!(client.describe_segment(segment).await?.is_closed);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use workerlink_core::clock::to_wall_delta;
use workerlink_core::{
    metrics, Clock, CollectionId, CoreError, CoreResult, FieldId, FlushRequest,
    SegmentDescription, SegmentId, SystemClock, Timestamp, WriteNodeClient, WriteNodeConfig,
};

use crate::failure::{FailureQueue, MockFailure};
use crate::history::{CallHistory, CallHistoryEntry};

const CLIENT: &str = "write_node";

/// System field holding row ids.
pub const ROW_ID_FIELD: FieldId = FieldId::new(0);
/// System field holding insert timestamps.
pub const TIMESTAMP_FIELD: FieldId = FieldId::new(1);
/// First user-defined field id.
pub const FIRST_USER_FIELD: FieldId = FieldId::new(100);

/// A flush as recorded by the mock write node.
#[derive(Debug, Clone)]
pub struct FlushRecord {
    pub request: FlushRequest,
    /// Clock reading at submission; drives maturation.
    pub submitted_at: Instant,
    /// Wall time at submission; reported as `open_time`.
    pub submitted_wall: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct FlushTable {
    segments: HashMap<SegmentId, FlushRecord>,
    /// Most recent flush across all segments.
    latest: Option<FlushRecord>,
    total_flushes: u64,
}

/// Mock write node client for coordinator tests.
pub struct MockWriteNodeClient {
    config: WriteNodeConfig,
    clock: Arc<dyn Clock>,
    flushes: RwLock<FlushTable>,
    binlog_fields: Vec<FieldId>,
    failures: FailureQueue,
    history: CallHistory,
}

impl MockWriteNodeClient {
    /// Create a mock with the reference 2s maturation on real time.
    pub fn new() -> Self {
        Self::new_with_config(WriteNodeConfig::default(), Arc::new(SystemClock))
    }

    /// Create a mock with custom timing and clock.
    pub fn new_with_config(config: WriteNodeConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            flushes: RwLock::new(FlushTable::default()),
            binlog_fields: vec![ROW_ID_FIELD, TIMESTAMP_FIELD, FIRST_USER_FIELD],
            failures: FailureQueue::default(),
            history: CallHistory::default(),
        }
    }

    /// Create a mock with a deterministic failure pattern.
    ///
    /// Failures are consumed in order, one per call. Once the queue is empty,
    /// all operations succeed.
    pub fn new_with_failures(pattern: Vec<MockFailure>) -> Self {
        let mut mock = Self::new();
        mock.failures = FailureQueue::new(pattern);
        mock
    }

    /// Create a mock whose every call fails with `failure`.
    pub fn new_always_fail(failure: MockFailure) -> Self {
        let mut mock = Self::new();
        mock.failures = FailureQueue::always(failure);
        mock
    }

    /// Replace the field ids reported by `get_insert_binlog_paths`.
    #[must_use]
    pub fn with_binlog_fields(mut self, fields: Vec<FieldId>) -> Self {
        self.binlog_fields = fields;
        self
    }

    /// Failure queue, for injecting failures mid-test.
    pub fn failures(&self) -> &FailureQueue {
        &self.failures
    }

    pub fn get_call_history(&self) -> Vec<CallHistoryEntry> {
        self.history.entries()
    }

    pub fn history(&self) -> &CallHistory {
        &self.history
    }

    /// Most recent flush across all segments.
    pub fn last_flush(&self) -> Option<FlushRecord> {
        self.flushes.read().latest.clone()
    }

    /// Current flush record for `segment_id`.
    pub fn flush_record(&self, segment_id: SegmentId) -> Option<FlushRecord> {
        self.flushes.read().segments.get(&segment_id).cloned()
    }

    /// Total accepted flushes, including re-flushes of the same segment.
    pub fn flush_count(&self) -> u64 {
        self.flushes.read().total_flushes
    }

    /// Forget all flushes and history.
    pub fn reset(&self) {
        *self.flushes.write() = FlushTable::default();
        self.history.clear();
    }

    fn check_failure(&self, segment_id: SegmentId) -> Option<CoreError> {
        let error = self
            .failures
            .next()?
            .into_error(CLIENT, "segment", segment_id)?;
        warn!("Injected {} failure for segment {}: {}", CLIENT, segment_id, error);
        Some(error)
    }

    fn record_call(&self, operation: &'static str, segment_id: SegmentId, success: bool) {
        self.history
            .record(operation, segment_id.to_string(), success, self.clock.now());
        metrics::record_call(CLIENT, operation, success);
    }

    fn describe_from(
        &self,
        segment_id: SegmentId,
        record: Option<&FlushRecord>,
        now: Instant,
    ) -> SegmentDescription {
        let maturation = self.config.maturation();
        let (is_closed, open_time) = match record {
            // Saturates so a flush is never observed in the future of its own clock.
            Some(record) => (
                now.saturating_duration_since(record.submitted_at) >= maturation,
                record.submitted_wall,
            ),
            // Unix epoch.
            None => (true, DateTime::<Utc>::default()),
        };

        SegmentDescription {
            segment_id,
            is_closed,
            open_time,
            close_time: is_closed.then(|| open_time + to_wall_delta(maturation)),
        }
    }
}

impl Default for MockWriteNodeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WriteNodeClient for MockWriteNodeClient {
    async fn flush_segment(
        &self,
        segment_id: SegmentId,
        collection_id: CollectionId,
        partition_tag: &str,
        timestamp: Timestamp,
    ) -> CoreResult<()> {
        if let Some(error) = self.check_failure(segment_id) {
            self.record_call("flush_segment", segment_id, false);
            return Err(error);
        }

        let record = {
            let mut table = self.flushes.write();
            let record = FlushRecord {
                request: FlushRequest {
                    segment_id,
                    collection_id,
                    partition_tag: partition_tag.to_string(),
                    timestamp,
                },
                submitted_at: self.clock.now(),
                submitted_wall: self.clock.wall(),
            };
            table.segments.insert(segment_id, record.clone());
            table.latest = Some(record.clone());
            table.total_flushes += 1;
            record
        };

        info!(
            "Flush submitted for segment {} (collection {}, partition {}, ts {})",
            segment_id, collection_id, partition_tag, record.request.timestamp
        );
        self.record_call("flush_segment", segment_id, true);
        metrics::record_submission("flush");

        Ok(())
    }

    async fn describe_segment(&self, segment_id: SegmentId) -> CoreResult<SegmentDescription> {
        if let Some(error) = self.check_failure(segment_id) {
            self.record_call("describe_segment", segment_id, false);
            return Err(error);
        }

        let description = {
            let table = self.flushes.read();
            let now = self.clock.now();
            // Unknown segments follow the latest flush, matching a single-job worker.
            let record = table.segments.get(&segment_id).or(table.latest.as_ref());
            self.describe_from(segment_id, record, now)
        };

        debug!("Segment {} is {}", segment_id, description.state().as_str());
        self.record_call("describe_segment", segment_id, true);
        Ok(description)
    }

    async fn get_insert_binlog_paths(
        &self,
        segment_id: SegmentId,
    ) -> CoreResult<BTreeMap<FieldId, Vec<String>>> {
        if let Some(error) = self.check_failure(segment_id) {
            self.record_call("get_insert_binlog_paths", segment_id, false);
            return Err(error);
        }

        let paths = self
            .binlog_fields
            .iter()
            .map(|field_id| {
                (
                    *field_id,
                    vec![format!("/binlog/insert/{segment_id}/file_{field_id}")],
                )
            })
            .collect();

        self.record_call("get_insert_binlog_paths", segment_id, true);
        Ok(paths)
    }
}
