//! Job lifecycle scenarios against the mock worker clients.
//!
//! Most tests drive a ManualClock so maturation is crossed without sleeping;
//! the poll helper tests run on real time with short thresholds.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use workerlink_core::{
    wait_index_finished, wait_segment_closed, BuildIndexClient, BuildIndexConfig,
    BuildIndexRequest, CollectionId, CoreError, ErrorCode, FieldId, IndexFilePathsRequest,
    IndexId, IndexState, IndexStatesRequest, LoadIndexClient, ManualClock, PollConfig, SegmentId,
    SystemClock, Timestamp, WriteNodeClient, WriteNodeConfig,
};
use workerlink_mock::{MockBuildIndexClient, MockFailure, MockLoadIndexClient, MockWriteNodeClient};

const THRESHOLD: Duration = Duration::from_secs(2);

fn write_node() -> (MockWriteNodeClient, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let client = MockWriteNodeClient::new_with_config(WriteNodeConfig::default(), clock.clone());
    (client, clock)
}

fn build_node() -> (MockBuildIndexClient, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let client = MockBuildIndexClient::new_with_config(BuildIndexConfig::default(), clock.clone());
    (client, clock)
}

fn ids(raw: &[i64]) -> Vec<IndexId> {
    raw.iter().copied().map(IndexId::new).collect()
}

#[tokio::test]
async fn test_flush_then_describe_scenario() {
    let (client, clock) = write_node();
    let segment = SegmentId::new(42);

    client
        .flush_segment(segment, CollectionId::new(1), "p0", Timestamp::new(100))
        .await
        .unwrap();

    let desc = client.describe_segment(segment).await.unwrap();
    assert_eq!(desc.segment_id, segment);
    assert!(!desc.is_closed);

    clock.advance(THRESHOLD + Duration::from_millis(10));

    let desc = client.describe_segment(segment).await.unwrap();
    assert_eq!(desc.segment_id, segment);
    assert!(desc.is_closed);
}

#[tokio::test]
async fn test_closed_is_monotonic_until_next_flush() {
    let (client, clock) = write_node();
    let segment = SegmentId::new(42);
    client
        .flush_segment(segment, CollectionId::new(1), "p0", Timestamp::new(100))
        .await
        .unwrap();

    clock.advance(THRESHOLD);
    for _ in 0..5 {
        clock.advance(Duration::from_secs(10));
        assert!(client.describe_segment(segment).await.unwrap().is_closed);
    }

    client
        .flush_segment(segment, CollectionId::new(1), "p0", Timestamp::new(200))
        .await
        .unwrap();
    assert!(!client.describe_segment(segment).await.unwrap().is_closed);
}

#[tokio::test]
async fn test_build_then_poll_scenario() {
    let (client, clock) = build_node();

    let response = client.build_index(BuildIndexRequest::default()).await.unwrap();
    assert_eq!(response.status.error_code, ErrorCode::Success);
    assert_eq!(response.index_id, IndexId::new(1));

    let states = client
        .get_index_states(IndexStatesRequest { index_ids: ids(&[1]) })
        .await
        .unwrap();
    assert!(states.status.is_success());
    assert_eq!(states.states.len(), 1);
    assert_eq!(states.states[0].state, IndexState::InProgress);

    clock.advance(THRESHOLD);

    let states = client
        .get_index_states(IndexStatesRequest { index_ids: ids(&[1]) })
        .await
        .unwrap();
    assert_eq!(states.states[0].index_id, IndexId::new(1));
    assert_eq!(states.states[0].state, IndexState::Finished);
}

#[tokio::test]
async fn test_all_requested_ids_transition_together_for_single_job() {
    let (client, clock) = build_node();
    client.build_index(BuildIndexRequest::default()).await.unwrap();

    let request = IndexStatesRequest {
        index_ids: ids(&[1, 2, 3]),
    };
    let before = client.get_index_states(request.clone()).await.unwrap();
    assert!(before
        .states
        .iter()
        .all(|info| info.state == IndexState::InProgress));

    clock.advance(THRESHOLD);
    let after = client.get_index_states(request).await.unwrap();
    assert!(after.all_finished());
    assert_eq!(after.states.len(), 3);
}

#[tokio::test]
async fn test_overlapping_builds_transition_together() {
    let (client, clock) = build_node();
    let first = client.build_index(BuildIndexRequest::default()).await.unwrap();
    clock.advance(Duration::from_millis(1500));
    let second = client.build_index(BuildIndexRequest::default()).await.unwrap();

    let request = IndexStatesRequest {
        index_ids: vec![first.index_id, second.index_id],
    };

    // First build is past its own threshold; still reported with the second.
    clock.advance(Duration::from_millis(600));
    let states = client.get_index_states(request.clone()).await.unwrap();
    assert!(states.status.is_success());
    assert!(states
        .states
        .iter()
        .all(|info| info.state == IndexState::InProgress));

    clock.advance(Duration::from_millis(1399));
    let states = client.get_index_states(request.clone()).await.unwrap();
    assert!(!states.all_finished());

    clock.advance(Duration::from_millis(1));
    let states = client.get_index_states(request).await.unwrap();
    assert!(states.all_finished());
    assert_eq!(states.states[0].index_id, first.index_id);
    assert_eq!(states.states[1].index_id, second.index_id);
}

#[tokio::test]
async fn test_polls_before_any_submission_report_matured() {
    let (writer, _clock) = write_node();
    let desc = writer.describe_segment(SegmentId::new(42)).await.unwrap();
    assert!(desc.is_closed);

    let (builder, _clock) = build_node();
    let states = builder
        .get_index_states(IndexStatesRequest { index_ids: ids(&[1]) })
        .await
        .unwrap();
    assert_eq!(states.status.error_code, ErrorCode::Success);
    assert_eq!(states.states[0].state, IndexState::Finished);
}

#[tokio::test]
async fn test_file_paths_scenario_and_idempotence() {
    let (client, _clock) = build_node();
    let request = IndexFilePathsRequest {
        index_ids: ids(&[1, 2]),
    };

    let first = client.get_index_file_paths(request.clone()).await.unwrap();
    assert!(first.status.is_success());
    assert_eq!(first.file_paths.len(), 2);
    for (info, expected) in first.file_paths.iter().zip([1, 2]) {
        assert_eq!(info.index_id, IndexId::new(expected));
        assert!(info.status.is_success());
        assert!(!info.index_file_paths.is_empty());
    }

    let second = client.get_index_file_paths(request).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_binlog_paths_idempotent() {
    let (client, _clock) = write_node();
    let first = client.get_insert_binlog_paths(SegmentId::new(42)).await.unwrap();
    let second = client.get_insert_binlog_paths(SegmentId::new(42)).await.unwrap();
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_load_index_scenario() {
    let client = MockLoadIndexClient::new();
    let paths = vec![
        "/binlog/index/1/file_1".to_string(),
        "/binlog/index/1/file_2".to_string(),
    ];

    client
        .load_index(&paths, SegmentId::new(7), FieldId::new(3), "vec", &HashMap::new())
        .await
        .unwrap();

    assert!(client.loaded(SegmentId::new(7), FieldId::new(3)).is_some());
}

#[tokio::test]
async fn test_flush_build_load_pipeline() {
    let clock = Arc::new(ManualClock::new());
    let writer = MockWriteNodeClient::new_with_config(WriteNodeConfig::default(), clock.clone());
    let builder = MockBuildIndexClient::new_with_config(BuildIndexConfig::default(), clock.clone());
    let loader = MockLoadIndexClient::new_with_clock(clock.clone());
    let segment = SegmentId::new(42);
    let vector_field = FieldId::new(100);

    writer
        .flush_segment(segment, CollectionId::new(1), "p0", Timestamp::new(100))
        .await
        .unwrap();
    clock.advance(THRESHOLD);
    assert!(writer.describe_segment(segment).await.unwrap().is_closed);

    let binlogs = writer.get_insert_binlog_paths(segment).await.unwrap();
    let build = builder
        .build_index(BuildIndexRequest {
            data_paths: binlogs[&vector_field].clone(),
            ..BuildIndexRequest::default()
        })
        .await
        .unwrap();
    build.status.clone().into_result().unwrap();

    clock.advance(THRESHOLD);
    let states = builder
        .get_index_states(IndexStatesRequest {
            index_ids: vec![build.index_id],
        })
        .await
        .unwrap();
    assert!(states.all_finished());

    let files = builder
        .get_index_file_paths(IndexFilePathsRequest {
            index_ids: vec![build.index_id],
        })
        .await
        .unwrap();
    let paths = files.paths_for(build.index_id).unwrap().to_vec();

    loader
        .load_index(&paths, segment, vector_field, "vec", &HashMap::new())
        .await
        .unwrap();
    assert_eq!(loader.loaded_fields(segment), vec![vector_field]);
    assert_eq!(
        builder.job(build.index_id).unwrap().request.data_paths,
        vec!["/binlog/insert/42/file_100".to_string()]
    );
}

#[tokio::test]
async fn test_failures_are_never_reported_as_success() {
    let writer = MockWriteNodeClient::new_with_failures(vec![
        MockFailure::Ok,
        MockFailure::Internal("disk full"),
    ]);
    writer
        .flush_segment(SegmentId::new(1), CollectionId::new(1), "p0", Timestamp::new(1))
        .await
        .unwrap();
    let err = writer.describe_segment(SegmentId::new(1)).await.unwrap_err();
    assert!(matches!(err, CoreError::Internal { .. }));

    let builder = MockBuildIndexClient::new_with_failures(vec![
        MockFailure::Ok,
        MockFailure::NotFound,
        MockFailure::Transport("connection reset"),
    ]);
    builder.build_index(BuildIndexRequest::default()).await.unwrap();

    let states = builder
        .get_index_states(IndexStatesRequest { index_ids: ids(&[1]) })
        .await
        .unwrap();
    assert_eq!(states.status.error_code, ErrorCode::IndexNotExist);
    assert!(!states.all_finished());

    let err = builder
        .get_index_file_paths(IndexFilePathsRequest { index_ids: ids(&[1]) })
        .await
        .unwrap_err();
    assert!(err.is_retriable());

    let loader = MockLoadIndexClient::new_with_failures(vec![MockFailure::Admission(
        "not enough memory",
    )]);
    let err = loader
        .load_index(&[], SegmentId::new(7), FieldId::new(3), "vec", &HashMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Admission { .. }));
}

#[tokio::test]
async fn test_failures_can_be_injected_mid_test() {
    let (client, _clock) = write_node();
    client
        .flush_segment(SegmentId::new(1), CollectionId::new(1), "p0", Timestamp::new(1))
        .await
        .unwrap();

    client.failures().extend([MockFailure::NotFound]);
    let err = client.describe_segment(SegmentId::new(1)).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));
    assert!(client.describe_segment(SegmentId::new(1)).await.is_ok());
}

#[tokio::test]
async fn test_wait_segment_closed_on_real_time() {
    let client = MockWriteNodeClient::new_with_config(
        WriteNodeConfig { maturation_ms: 50 },
        Arc::new(SystemClock),
    );
    let segment = SegmentId::new(42);
    client
        .flush_segment(segment, CollectionId::new(1), "p0", Timestamp::new(100))
        .await
        .unwrap();

    let poll = PollConfig {
        interval_ms: 10,
        timeout_ms: 5_000,
    };
    let desc = wait_segment_closed(&client, segment, &poll).await.unwrap();
    assert!(desc.is_closed);
    assert!(client.history().successes("describe_segment") >= 2);
}

#[tokio::test]
async fn test_wait_index_finished_on_real_time() {
    let client = MockBuildIndexClient::new_with_config(
        BuildIndexConfig {
            maturation_ms: 50,
            files_per_index: 1,
        },
        Arc::new(SystemClock),
    );
    let response = client.build_index(BuildIndexRequest::default()).await.unwrap();

    let poll = PollConfig {
        interval_ms: 10,
        timeout_ms: 5_000,
    };
    let states = wait_index_finished(&client, &[response.index_id], &poll)
        .await
        .unwrap();
    assert_eq!(states[0].state, IndexState::Finished);
}

#[tokio::test]
async fn test_wait_gives_up_at_timeout() {
    let client = MockWriteNodeClient::new_with_config(
        WriteNodeConfig {
            maturation_ms: 60_000,
        },
        Arc::new(SystemClock),
    );
    client
        .flush_segment(SegmentId::new(1), CollectionId::new(1), "p0", Timestamp::new(1))
        .await
        .unwrap();

    let poll = PollConfig {
        interval_ms: 5,
        timeout_ms: 30,
    };
    let err = wait_segment_closed(&client, SegmentId::new(1), &poll)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::DeadlineExceeded { .. }));
}
