use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::ids::{FieldId, IndexId, SegmentId};
use crate::status::Status;

/// Progress of an index build job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexState {
    /// Build submitted and still running.
    InProgress,
    /// Build artifacts are written. Terminal.
    Finished,
}

impl IndexState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Finished => "FINISHED",
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl FromStr for IndexState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_PROGRESS" => Ok(Self::InProgress),
            "FINISHED" => Ok(Self::Finished),
            _ => Err(()),
        }
    }
}

/// String key/value pair used for index type and build parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub key: String,
    pub value: String,
}

impl KeyValuePair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Index construction job submitted to a build worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildIndexRequest {
    /// Binlog files holding the raw field data to index.
    pub data_paths: Vec<String>,
    /// Field type parameters (e.g. `dim`).
    pub type_params: Vec<KeyValuePair>,
    /// Index parameters (e.g. `index_type`, `metric_type`, `nlist`).
    pub index_params: Vec<KeyValuePair>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildIndexResponse {
    pub status: Status,
    pub index_id: IndexId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatesRequest {
    pub index_ids: Vec<IndexId>,
}

/// Point-in-time state of one build job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub index_id: IndexId,
    pub state: IndexState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatesResponse {
    pub status: Status,
    /// One entry per requested id, in request order.
    pub states: Vec<IndexInfo>,
}

impl IndexStatesResponse {
    /// True when the envelope succeeded and every listed job has finished.
    #[must_use]
    pub fn all_finished(&self) -> bool {
        self.status.is_success() && self.states.iter().all(|info| info.state.is_terminal())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexFilePathsRequest {
    pub index_ids: Vec<IndexId>,
}

/// Artifact locations produced by one build job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexFilePathInfo {
    pub status: Status,
    pub index_id: IndexId,
    pub index_file_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexFilePathsResponse {
    pub status: Status,
    /// One entry per requested id, in request order.
    pub file_paths: Vec<IndexFilePathInfo>,
}

impl IndexFilePathsResponse {
    /// Paths resolved for `index_id`, if it was part of the request.
    #[must_use]
    pub fn paths_for(&self, index_id: IndexId) -> Option<&[String]> {
        self.file_paths
            .iter()
            .find(|info| info.index_id == index_id)
            .map(|info| info.index_file_paths.as_slice())
    }
}

/// Instruction for a serving node to materialize a built index for one
/// field of a sealed segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadIndexRequest {
    pub index_paths: Vec<String>,
    pub segment_id: SegmentId,
    pub field_id: FieldId,
    pub field_name: String,
    pub index_params: HashMap<String, String>,
}
