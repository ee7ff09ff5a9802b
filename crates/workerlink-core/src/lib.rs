//! Core types and client traits for dispatching long-running jobs to worker nodes.
//!
//! A coordinator submits work (segment flush, index build, index load) through
//! one of the client traits and observes completion by polling. Nothing in this
//! crate blocks on a remote event; see [`poll`] for coordinator-side waiting.

pub mod clock;
pub mod config;
pub mod error;
pub mod ids;
pub mod index;
pub mod metrics;
pub mod poll;
pub mod segment;
pub mod status;
pub mod traits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use crate::config::{BuildIndexConfig, PollConfig, WorkerLinkConfig, WriteNodeConfig};
pub use error::{CoreError, CoreResult};
pub use ids::{CollectionId, FieldId, IndexId, SegmentId, Timestamp};
pub use index::{
    BuildIndexRequest, BuildIndexResponse, IndexFilePathInfo, IndexFilePathsRequest,
    IndexFilePathsResponse, IndexInfo, IndexState, IndexStatesRequest, IndexStatesResponse,
    KeyValuePair, LoadIndexRequest,
};
pub use poll::{wait_index_finished, wait_segment_closed};
pub use segment::{FlushRequest, SegmentDescription, SegmentState};
pub use status::{ErrorCode, Status};
pub use traits::{BuildIndexClient, LoadIndexClient, WriteNodeClient};
