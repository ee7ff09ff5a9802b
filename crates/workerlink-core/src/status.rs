use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// Result code carried in every worker response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request completed.
    #[default]
    Success,
    /// Unclassified worker failure.
    UnexpectedError,
    /// Index construction failed on the build worker.
    BuildIndexError,
    /// Requested index id is unknown to the worker.
    IndexNotExist,
    /// Worker could not read or write its metadata.
    MetaFailed,
    /// Worker lacks resources to serve the request.
    NoEnoughResource,
}

impl ErrorCode {
    /// Returns the canonical wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::UnexpectedError => "UNEXPECTED_ERROR",
            Self::BuildIndexError => "BUILD_INDEX_ERROR",
            Self::IndexNotExist => "INDEX_NOT_EXIST",
            Self::MetaFailed => "META_FAILED",
            Self::NoEnoughResource => "NO_ENOUGH_RESOURCE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Success/failure envelope attached to build, describe and resolve responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Status {
    pub error_code: ErrorCode,
    /// Worker-supplied reason, empty on success.
    #[serde(default)]
    pub reason: String,
}

impl Status {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn error(error_code: ErrorCode, reason: impl Into<String>) -> Self {
        Self {
            error_code,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error_code == ErrorCode::Success
    }

    /// Converts a non-success envelope into [`CoreError::Internal`].
    ///
    /// Callers that only look at the payload of a response should go through
    /// this first so a failed status is never mistaken for a result.
    pub fn into_result(self) -> CoreResult<()> {
        if self.is_success() {
            Ok(())
        } else if self.reason.is_empty() {
            Err(CoreError::internal(self.error_code.as_str()))
        } else {
            Err(CoreError::internal(format!(
                "{}: {}",
                self.error_code, self.reason
            )))
        }
    }
}
