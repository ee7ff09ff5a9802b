//! Mock index build client
//!
//! Allocates index ids from 1 upwards and keeps every accepted job for
//! inspection, but tracks a single build clock: every polled id reports
//! `IN_PROGRESS` until the most recent submission has matured, then
//! `FINISHED`. Before the first submission all ids report `FINISHED`.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use workerlink_core::{
    metrics, BuildIndexClient, BuildIndexConfig, BuildIndexRequest, BuildIndexResponse, Clock,
    CoreResult, ErrorCode, IndexFilePathInfo, IndexFilePathsRequest, IndexFilePathsResponse,
    IndexId, IndexInfo, IndexState, IndexStatesRequest, IndexStatesResponse, Status, SystemClock,
};

use crate::failure::{FailureQueue, MockFailure};
use crate::history::{CallHistory, CallHistoryEntry};

const CLIENT: &str = "index_node";

/// A build job accepted by the mock.
#[derive(Debug, Clone)]
pub struct IndexJob {
    pub index_id: IndexId,
    pub request: BuildIndexRequest,
    /// Clock reading at submission.
    pub submitted_at: Instant,
}

#[derive(Debug, Default)]
struct JobTable {
    jobs: HashMap<IndexId, IndexJob>,
    /// Submission instant of the most recent build; drives every poll.
    last_build: Option<Instant>,
}

/// Mock index build client for coordinator tests.
pub struct MockBuildIndexClient {
    config: BuildIndexConfig,
    clock: Arc<dyn Clock>,
    next_id: AtomicI64,
    jobs: RwLock<JobTable>,
    failures: FailureQueue,
    history: CallHistory,
}

impl MockBuildIndexClient {
    /// Create a mock with the reference 2s maturation on real time.
    pub fn new() -> Self {
        Self::new_with_config(BuildIndexConfig::default(), Arc::new(SystemClock))
    }

    pub fn new_with_config(config: BuildIndexConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            next_id: AtomicI64::new(1),
            jobs: RwLock::new(JobTable::default()),
            failures: FailureQueue::default(),
            history: CallHistory::default(),
        }
    }

    /// Create a mock with a deterministic failure pattern.
    ///
    /// `Transport` and `Admission` come back as `Err`. `Internal` and
    /// `NotFound` come back as a failed `Status` inside an `Ok` response,
    /// the way a worker reports a build it accepted but could not serve.
    pub fn new_with_failures(pattern: Vec<MockFailure>) -> Self {
        let mut mock = Self::new();
        mock.failures = FailureQueue::new(pattern);
        mock
    }

    pub fn new_always_fail(failure: MockFailure) -> Self {
        let mut mock = Self::new();
        mock.failures = FailureQueue::always(failure);
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

    pub fn job(&self, index_id: IndexId) -> Option<IndexJob> {
        self.jobs.read().jobs.get(&index_id).cloned()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.read().jobs.len()
    }

    /// Artifact paths reported for `index_id`.
    pub fn file_paths_for(&self, index_id: IndexId) -> Vec<String> {
        (1..=self.config.files_per_index)
            .map(|n| format!("/binlog/index/{index_id}/file_{n}"))
            .collect()
    }

    /// Pops the next injected failure.
    ///
    /// `Err` for transport/admission failures; `Ok(Some(status))` for
    /// failures reported through the envelope.
    fn check_failure(&self, operation: &'static str, target: &str) -> CoreResult<Option<Status>> {
        let Some(failure) = self.failures.next() else {
            return Ok(None);
        };
        warn!("Injected {} failure on {} for {}: {:?}", CLIENT, operation, target, failure);

        match failure {
            MockFailure::Internal(msg) => Ok(Some(Status::error(ErrorCode::BuildIndexError, msg))),
            MockFailure::NotFound => Ok(Some(Status::error(
                ErrorCode::IndexNotExist,
                format!("index {target} does not exist"),
            ))),
            other => match other.into_error(CLIENT, "index", target) {
                Some(error) => Err(error),
                None => Ok(None),
            },
        }
    }

    fn record_call(&self, operation: &'static str, target: String, success: bool) {
        self.history
            .record(operation, target, success, self.clock.now());
        metrics::record_call(CLIENT, operation, success);
    }

    /// State shared by all ids. Nothing submitted yet counts as matured.
    fn current_state(&self, last_build: Option<Instant>, now: Instant) -> IndexState {
        match last_build {
            Some(submitted_at)
                if now.saturating_duration_since(submitted_at) < self.config.maturation() =>
            {
                IndexState::InProgress
            }
            _ => IndexState::Finished,
        }
    }
}

impl Default for MockBuildIndexClient {
    fn default() -> Self {
        Self::new()
    }
}

fn describe_ids(index_ids: &[IndexId]) -> String {
    let ids: Vec<String> = index_ids.iter().map(ToString::to_string).collect();
    ids.join(",")
}

#[async_trait]
impl BuildIndexClient for MockBuildIndexClient {
    async fn build_index(&self, request: BuildIndexRequest) -> CoreResult<BuildIndexResponse> {
        let failed_status = match self.check_failure("build_index", "new") {
            Ok(status) => status,
            Err(error) => {
                self.record_call("build_index", "new".to_string(), false);
                return Err(error);
            }
        };

        if let Some(status) = failed_status {
            self.record_call("build_index", "new".to_string(), false);
            return Ok(BuildIndexResponse {
                status,
                index_id: IndexId::default(),
            });
        }

        let index_id = {
            let mut table = self.jobs.write();
            let index_id = IndexId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
            let submitted_at = self.clock.now();
            table.jobs.insert(
                index_id,
                IndexJob {
                    index_id,
                    request,
                    submitted_at,
                },
            );
            table.last_build = Some(submitted_at);
            index_id
        };

        info!("Index build {} submitted", index_id);
        self.record_call("build_index", index_id.to_string(), true);
        metrics::record_submission("build_index");

        Ok(BuildIndexResponse {
            status: Status::success(),
            index_id,
        })
    }

    async fn get_index_states(
        &self,
        request: IndexStatesRequest,
    ) -> CoreResult<IndexStatesResponse> {
        let target = describe_ids(&request.index_ids);
        match self.check_failure("get_index_states", &target) {
            Ok(Some(status)) => {
                self.record_call("get_index_states", target, false);
                return Ok(IndexStatesResponse {
                    status,
                    states: Vec::new(),
                });
            }
            Err(error) => {
                self.record_call("get_index_states", target, false);
                return Err(error);
            }
            Ok(None) => {}
        }

        let state = {
            let table = self.jobs.read();
            self.current_state(table.last_build, self.clock.now())
        };

        let states: Vec<IndexInfo> = request
            .index_ids
            .iter()
            .map(|index_id| IndexInfo {
                index_id: *index_id,
                state,
            })
            .collect();

        debug!("Index states for [{}]: {}", target, state.as_str());
        self.record_call("get_index_states", target, true);

        Ok(IndexStatesResponse {
            status: Status::success(),
            states,
        })
    }

    async fn get_index_file_paths(
        &self,
        request: IndexFilePathsRequest,
    ) -> CoreResult<IndexFilePathsResponse> {
        let target = describe_ids(&request.index_ids);
        match self.check_failure("get_index_file_paths", &target) {
            Ok(Some(status)) => {
                self.record_call("get_index_file_paths", target, false);
                return Ok(IndexFilePathsResponse {
                    status,
                    file_paths: Vec::new(),
                });
            }
            Err(error) => {
                self.record_call("get_index_file_paths", target, false);
                return Err(error);
            }
            Ok(None) => {}
        }

        let state = {
            let table = self.jobs.read();
            self.current_state(table.last_build, self.clock.now())
        };
        if !state.is_terminal() {
            debug!("Resolving file paths for unfinished indexes [{}]", target);
        }

        let file_paths = request
            .index_ids
            .iter()
            .map(|index_id| IndexFilePathInfo {
                status: Status::success(),
                index_id: *index_id,
                index_file_paths: self.file_paths_for(*index_id),
            })
            .collect();

        self.record_call("get_index_file_paths", target, true);

        Ok(IndexFilePathsResponse {
            status: Status::success(),
            file_paths,
        })
    }
}
