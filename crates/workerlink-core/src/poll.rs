//! Coordinator-side waiting on submitted jobs.
//!
//! The clients never block; these helpers poll them on a fixed cadence until
//! the job reports completion or the configured timeout passes. Errors from
//! the client end the wait immediately. Retrying is left to the caller.

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::config::PollConfig;
use crate::error::{CoreError, CoreResult};
use crate::ids::{IndexId, SegmentId};
use crate::index::{IndexInfo, IndexStatesRequest};
use crate::segment::SegmentDescription;
use crate::traits::{BuildIndexClient, WriteNodeClient};

/// Polls `describe_segment` until the segment reports closed.
pub async fn wait_segment_closed<C>(
    client: &C,
    segment_id: SegmentId,
    config: &PollConfig,
) -> CoreResult<SegmentDescription>
where
    C: WriteNodeClient + ?Sized,
{
    let started = Instant::now();
    let mut polls = 0u32;

    loop {
        let description = client.describe_segment(segment_id).await?;
        polls += 1;
        if description.is_closed {
            debug!("Segment {} closed after {} polls", segment_id, polls);
            return Ok(description);
        }

        check_deadline(started, config, || format!("segment {segment_id}"))?;
        sleep(config.interval()).await;
    }
}

/// Polls `get_index_states` until every job in `index_ids` has finished.
///
/// A non-success status envelope ends the wait with `CoreError::Internal`.
pub async fn wait_index_finished<C>(
    client: &C,
    index_ids: &[IndexId],
    config: &PollConfig,
) -> CoreResult<Vec<IndexInfo>>
where
    C: BuildIndexClient + ?Sized,
{
    let started = Instant::now();
    let mut polls = 0u32;

    loop {
        let response = client
            .get_index_states(IndexStatesRequest {
                index_ids: index_ids.to_vec(),
            })
            .await?;
        response.status.clone().into_result()?;
        polls += 1;

        if response.states.len() != index_ids.len() {
            return Err(CoreError::internal(format!(
                "worker returned {} states for {} index ids",
                response.states.len(),
                index_ids.len()
            )));
        }

        if response.all_finished() {
            debug!("Index jobs {:?} finished after {} polls", index_ids, polls);
            return Ok(response.states);
        }

        check_deadline(started, config, || format!("index jobs {index_ids:?}"))?;
        sleep(config.interval()).await;
    }
}

fn check_deadline(
    started: Instant,
    config: &PollConfig,
    what: impl FnOnce() -> String,
) -> CoreResult<()> {
    let elapsed = started.elapsed();
    if elapsed >= config.timeout() {
        return Err(CoreError::DeadlineExceeded {
            what: what(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{CollectionId, FieldId, Timestamp};
    use crate::index::{
        BuildIndexRequest, BuildIndexResponse, IndexFilePathsRequest, IndexFilePathsResponse,
        IndexState, IndexStatesResponse,
    };
    use crate::status::{ErrorCode, Status};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Reports finished/closed once `ready_after` polls have been made.
    struct CountingWorker {
        polls: AtomicU32,
        ready_after: u32,
        status: Status,
    }

    impl CountingWorker {
        fn new(ready_after: u32) -> Self {
            Self {
                polls: AtomicU32::new(0),
                ready_after,
                status: Status::success(),
            }
        }

        fn ready(&self) -> bool {
            self.polls.fetch_add(1, Ordering::SeqCst) + 1 >= self.ready_after
        }
    }

    #[async_trait]
    impl WriteNodeClient for CountingWorker {
        async fn flush_segment(
            &self,
            _segment_id: SegmentId,
            _collection_id: CollectionId,
            _partition_tag: &str,
            _timestamp: Timestamp,
        ) -> CoreResult<()> {
            Ok(())
        }

        async fn describe_segment(&self, segment_id: SegmentId) -> CoreResult<SegmentDescription> {
            let is_closed = self.ready();
            Ok(SegmentDescription {
                segment_id,
                is_closed,
                open_time: Utc::now(),
                close_time: is_closed.then(Utc::now),
            })
        }

        async fn get_insert_binlog_paths(
            &self,
            _segment_id: SegmentId,
        ) -> CoreResult<BTreeMap<FieldId, Vec<String>>> {
            Ok(BTreeMap::new())
        }
    }

    #[async_trait]
    impl BuildIndexClient for CountingWorker {
        async fn build_index(&self, _request: BuildIndexRequest) -> CoreResult<BuildIndexResponse> {
            Ok(BuildIndexResponse {
                status: Status::success(),
                index_id: IndexId::new(1),
            })
        }

        async fn get_index_states(
            &self,
            request: IndexStatesRequest,
        ) -> CoreResult<IndexStatesResponse> {
            let state = if self.ready() {
                IndexState::Finished
            } else {
                IndexState::InProgress
            };
            Ok(IndexStatesResponse {
                status: self.status.clone(),
                states: request
                    .index_ids
                    .into_iter()
                    .map(|index_id| IndexInfo { index_id, state })
                    .collect(),
            })
        }

        async fn get_index_file_paths(
            &self,
            _request: IndexFilePathsRequest,
        ) -> CoreResult<IndexFilePathsResponse> {
            Ok(IndexFilePathsResponse {
                status: Status::success(),
                file_paths: Vec::new(),
            })
        }
    }

    fn fast_poll() -> PollConfig {
        PollConfig {
            interval_ms: 10,
            timeout_ms: 1_000,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_segment_closed_polls_until_closed() {
        let worker = CountingWorker::new(3);
        let desc = wait_segment_closed(&worker, SegmentId::new(42), &fast_poll())
            .await
            .unwrap();

        assert!(desc.is_closed);
        assert_eq!(worker.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_segment_closed_times_out() {
        let worker = CountingWorker::new(u32::MAX);
        let err = wait_segment_closed(&worker, SegmentId::new(42), &fast_poll())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::DeadlineExceeded { .. }));
        assert!(err.is_retriable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_index_finished() {
        let worker = CountingWorker::new(2);
        let ids = [IndexId::new(1), IndexId::new(2)];
        let states = wait_index_finished(&worker, &ids, &fast_poll())
            .await
            .unwrap();

        assert_eq!(states.len(), 2);
        assert!(states.iter().all(|info| info.state == IndexState::Finished));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_index_finished_surfaces_failed_status() {
        let mut worker = CountingWorker::new(1);
        worker.status = Status::error(ErrorCode::BuildIndexError, "out of memory");

        let err = wait_index_finished(&worker, &[IndexId::new(1)], &fast_poll())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Internal { .. }));
    }
}
