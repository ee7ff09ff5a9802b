//! In-process stand-ins for the write, index build and index load workers.
//!
//! Each mock implements the matching `workerlink-core` client trait, derives
//! job progress lazily from a [`Clock`](workerlink_core::Clock), and supports
//! failure injection and call history for assertions.

pub mod build_index;
pub mod failure;
pub mod history;
pub mod load_index;
pub mod write_node;

pub use build_index::{IndexJob, MockBuildIndexClient};
pub use failure::{FailureQueue, MockFailure};
pub use history::{CallHistory, CallHistoryEntry, DEFAULT_HISTORY_CAPACITY};
pub use load_index::{LoadedIndex, MockLoadIndexClient};
pub use write_node::{
    FlushRecord, MockWriteNodeClient, FIRST_USER_FIELD, ROW_ID_FIELD, TIMESTAMP_FIELD,
};
