use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ids::{CollectionId, SegmentId, Timestamp};

/// Durability state of a segment as seen by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentState {
    /// Flush submitted but not yet sealed on the write node.
    Open,
    /// Segment durably persisted and sealed.
    Closed,
}

impl SegmentState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl FromStr for SegmentState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(()),
        }
    }
}

/// Parameters of a flush submitted to a write node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushRequest {
    pub segment_id: SegmentId,
    pub collection_id: CollectionId,
    pub partition_tag: String,
    /// Coordinator timestamp up to which data must be durable.
    pub timestamp: Timestamp,
}

/// Lifecycle snapshot of one segment returned by `describe_segment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentDescription {
    pub segment_id: SegmentId,
    pub is_closed: bool,
    /// Wall time at which the current flush cycle was submitted.
    pub open_time: DateTime<Utc>,
    /// Wall time at which the segment sealed; `None` while open.
    pub close_time: Option<DateTime<Utc>>,
}

impl SegmentDescription {
    #[must_use]
    pub fn state(&self) -> SegmentState {
        if self.is_closed {
            SegmentState::Closed
        } else {
            SegmentState::Open
        }
    }
}
