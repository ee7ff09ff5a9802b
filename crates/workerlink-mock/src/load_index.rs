//! Mock index load client
//!
//! Accepts every load immediately and keeps the last load per
//! (segment, field) so tests can check which indexes a serving node would
//! hold. Loading a field again replaces the previous index.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use workerlink_core::{
    metrics, Clock, CoreResult, FieldId, LoadIndexClient, LoadIndexRequest, SegmentId,
    SystemClock,
};

use crate::failure::{FailureQueue, MockFailure};
use crate::history::{CallHistory, CallHistoryEntry};

const CLIENT: &str = "query_node";

/// An index resident on the mock serving node.
#[derive(Debug, Clone)]
pub struct LoadedIndex {
    pub request: LoadIndexRequest,
    pub loaded_at: DateTime<Utc>,
}

/// Mock index load client for coordinator tests.
pub struct MockLoadIndexClient {
    clock: Arc<dyn Clock>,
    resident: RwLock<HashMap<(SegmentId, FieldId), LoadedIndex>>,
    failures: FailureQueue,
    history: CallHistory,
}

impl MockLoadIndexClient {
    pub fn new() -> Self {
        Self::new_with_clock(Arc::new(SystemClock))
    }

    pub fn new_with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            resident: RwLock::new(HashMap::new()),
            failures: FailureQueue::default(),
            history: CallHistory::default(),
        }
    }

    pub fn new_with_failures(pattern: Vec<MockFailure>) -> Self {
        let mut mock = Self::new();
        mock.failures = FailureQueue::new(pattern);
        mock
    }

    pub fn failures(&self) -> &FailureQueue {
        &self.failures
    }

    pub fn get_call_history(&self) -> Vec<CallHistoryEntry> {
        self.history.entries()
    }

    pub fn history(&self) -> &CallHistory {
        &self.history
    }

    /// Index currently loaded for a field of a segment.
    pub fn loaded(&self, segment_id: SegmentId, field_id: FieldId) -> Option<LoadedIndex> {
        self.resident.read().get(&(segment_id, field_id)).cloned()
    }

    /// Fields of `segment_id` with a resident index, ascending.
    pub fn loaded_fields(&self, segment_id: SegmentId) -> Vec<FieldId> {
        let mut fields: Vec<FieldId> = self
            .resident
            .read()
            .keys()
            .filter(|(segment, _)| *segment == segment_id)
            .map(|(_, field)| *field)
            .collect();
        fields.sort();
        fields
    }

    pub fn resident_count(&self) -> usize {
        self.resident.read().len()
    }

    /// Evicts a resident index. Returns whether one was present.
    pub fn drop_index(&self, segment_id: SegmentId, field_id: FieldId) -> bool {
        let removed = self.resident.write().remove(&(segment_id, field_id)).is_some();
        if removed {
            info!("Dropped index for segment {} field {}", segment_id, field_id);
        }
        removed
    }

    fn record_call(&self, target: String, success: bool) {
        self.history
            .record("load_index", target, success, self.clock.now());
        metrics::record_call(CLIENT, "load_index", success);
    }
}

impl Default for MockLoadIndexClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoadIndexClient for MockLoadIndexClient {
    async fn load_index(
        &self,
        index_paths: &[String],
        segment_id: SegmentId,
        field_id: FieldId,
        field_name: &str,
        index_params: &HashMap<String, String>,
    ) -> CoreResult<()> {
        let target = format!("{segment_id}/{field_id}");

        if let Some(error) = self
            .failures
            .next()
            .and_then(|failure| failure.into_error(CLIENT, "segment", segment_id))
        {
            warn!("Injected {} failure loading {}: {}", CLIENT, target, error);
            self.record_call(target, false);
            return Err(error);
        }

        let previous = self.resident.write().insert(
            (segment_id, field_id),
            LoadedIndex {
                request: LoadIndexRequest {
                    index_paths: index_paths.to_vec(),
                    segment_id,
                    field_id,
                    field_name: field_name.to_string(),
                    index_params: index_params.clone(),
                },
                loaded_at: self.clock.wall(),
            },
        );

        info!(
            "Loaded index for segment {} field {} ({}) from {} files{}",
            segment_id,
            field_id,
            field_name,
            index_paths.len(),
            if previous.is_some() { ", replacing previous" } else { "" }
        );
        self.record_call(target, true);
        metrics::record_submission("load_index");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use workerlink_core::CoreError;

    fn paths() -> Vec<String> {
        vec![
            "/binlog/index/1/file_1".to_string(),
            "/binlog/index/1/file_2".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_load_records_resident_index() {
        let mock = MockLoadIndexClient::new();
        let params = HashMap::from([("metric_type".to_string(), "L2".to_string())]);

        mock.load_index(&paths(), SegmentId::new(7), FieldId::new(3), "vec", &params)
            .await
            .unwrap();

        let loaded = mock.loaded(SegmentId::new(7), FieldId::new(3)).unwrap();
        assert_eq!(loaded.request.field_name, "vec");
        assert_eq!(loaded.request.index_paths, paths());
        assert_eq!(loaded.request.index_params["metric_type"], "L2");
        assert_eq!(mock.history().successes("load_index"), 1);
    }

    #[tokio::test]
    async fn test_reload_replaces_previous_index() {
        let mock = MockLoadIndexClient::new();
        let empty = HashMap::new();

        mock.load_index(&paths(), SegmentId::new(7), FieldId::new(3), "vec", &empty)
            .await
            .unwrap();
        let newer = vec!["/binlog/index/2/file_1".to_string()];
        mock.load_index(&newer, SegmentId::new(7), FieldId::new(3), "vec", &empty)
            .await
            .unwrap();

        assert_eq!(mock.resident_count(), 1);
        let loaded = mock.loaded(SegmentId::new(7), FieldId::new(3)).unwrap();
        assert_eq!(loaded.request.index_paths, newer);
    }

    #[tokio::test]
    async fn test_loaded_fields_and_drop() {
        let mock = MockLoadIndexClient::new();
        let empty = HashMap::new();
        for field in [101, 100] {
            mock.load_index(&paths(), SegmentId::new(7), FieldId::new(field), "f", &empty)
                .await
                .unwrap();
        }
        mock.load_index(&paths(), SegmentId::new(8), FieldId::new(100), "f", &empty)
            .await
            .unwrap();

        assert_eq!(
            mock.loaded_fields(SegmentId::new(7)),
            vec![FieldId::new(100), FieldId::new(101)]
        );
        assert!(mock.drop_index(SegmentId::new(7), FieldId::new(100)));
        assert!(!mock.drop_index(SegmentId::new(7), FieldId::new(100)));
        assert_eq!(mock.loaded_fields(SegmentId::new(7)), vec![FieldId::new(101)]);
    }

    #[tokio::test]
    async fn test_injected_failure_leaves_nothing_resident() {
        let mock = MockLoadIndexClient::new_with_failures(vec![MockFailure::Transport("eof")]);
        let err = mock
            .load_index(&paths(), SegmentId::new(7), FieldId::new(3), "vec", &HashMap::new())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Transport { .. }));
        assert_eq!(mock.resident_count(), 0);
        assert_eq!(mock.history().failures("load_index"), 1);
    }
}
