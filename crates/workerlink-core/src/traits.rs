use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

use crate::error::CoreResult;
use crate::ids::{CollectionId, FieldId, SegmentId, Timestamp};
use crate::index::{
    BuildIndexRequest, BuildIndexResponse, IndexFilePathsRequest, IndexFilePathsResponse,
    IndexStatesRequest, IndexStatesResponse,
};
use crate::segment::SegmentDescription;

/// Client for the data-write worker that persists and seals segments.
///
/// All implementations must be thread-safe (Send + Sync). No method waits for
/// the flush itself; completion is observed by polling [`describe_segment`].
///
/// # Errors
///
/// - `CoreError::Transport` if the worker is unreachable
/// - `CoreError::NotFound` if the segment is unknown
/// - `CoreError::Internal` if the worker reports a failure
///
/// [`describe_segment`]: WriteNodeClient::describe_segment
#[async_trait]
pub trait WriteNodeClient: Send + Sync {
    /// Submits a flush and returns once the worker has accepted it.
    ///
    /// Resets the segment's lifecycle to open even if a previous flush had
    /// already sealed it.
    async fn flush_segment(
        &self,
        segment_id: SegmentId,
        collection_id: CollectionId,
        partition_tag: &str,
        timestamp: Timestamp,
    ) -> CoreResult<()>;

    /// Returns the segment's current lifecycle state.
    async fn describe_segment(&self, segment_id: SegmentId) -> CoreResult<SegmentDescription>;

    /// Resolves insert binlog locations per field, ordered by field id.
    async fn get_insert_binlog_paths(
        &self,
        segment_id: SegmentId,
    ) -> CoreResult<BTreeMap<FieldId, Vec<String>>>;
}

/// Client for the index build worker.
///
/// `Err` is reserved for transport and admission failures; a build that the
/// worker accepted but could not complete is reported through the response
/// `Status` envelope.
#[async_trait]
pub trait BuildIndexClient: Send + Sync {
    /// Submits an index build job and returns its allocated id.
    async fn build_index(&self, request: BuildIndexRequest) -> CoreResult<BuildIndexResponse>;

    /// Returns one state per requested id, in request order.
    async fn get_index_states(&self, request: IndexStatesRequest)
        -> CoreResult<IndexStatesResponse>;

    /// Resolves artifact paths per requested id, in request order.
    ///
    /// Callers are expected to have confirmed completion via
    /// [`get_index_states`](BuildIndexClient::get_index_states) first.
    async fn get_index_file_paths(
        &self,
        request: IndexFilePathsRequest,
    ) -> CoreResult<IndexFilePathsResponse>;
}

/// Client for serving nodes that hold indexes in memory.
#[async_trait]
pub trait LoadIndexClient: Send + Sync {
    /// Fire-and-forget request to load an index for one field of a segment.
    async fn load_index(
        &self,
        index_paths: &[String],
        segment_id: SegmentId,
        field_id: FieldId,
        field_name: &str,
        index_params: &HashMap<String, String>,
    ) -> CoreResult<()>;
}
