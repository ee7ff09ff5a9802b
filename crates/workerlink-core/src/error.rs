use thiserror::Error;

/// Canonical error type for worker client operations.
///
/// Clients surface every failure through this type and never retry on their
/// own; retry policy belongs to the coordinator (see [`CoreError::is_retriable`]).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Worker could not be reached.
    #[error("transport error talking to {worker}: {message}")]
    Transport {
        /// Worker role or address (e.g. `"write_node"`).
        worker: &'static str,
        /// Transport-level details.
        message: String,
    },

    /// Worker refused to admit a submission (e.g. at capacity).
    #[error("{worker} rejected submission: {message}")]
    Admission {
        /// Worker role that rejected the request.
        worker: &'static str,
        /// Human-readable rejection reason.
        message: String,
    },

    /// Query referenced an identifier the worker does not know.
    #[error("{entity} `{id}` was not found")]
    NotFound {
        /// Entity type name (e.g. `"segment"`).
        entity: &'static str,
        /// Identifier of the missing entity.
        id: String,
    },

    /// Worker answered with a non-success status envelope.
    #[error("internal error: {message}")]
    Internal {
        /// Status code and reason reported by the worker.
        message: String,
    },

    /// A coordinator-side wait gave up before the job completed.
    #[error("deadline exceeded after {elapsed_ms}ms waiting for {what}")]
    DeadlineExceeded {
        /// What was being waited on (e.g. `"segment 42"`).
        what: String,
        /// Time spent waiting in milliseconds.
        elapsed_ms: u64,
    },

    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl CoreError {
    /// Creates a `Transport` variant.
    #[must_use]
    pub fn transport(worker: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            worker,
            message: message.into(),
        }
    }

    /// Creates an `Admission` variant.
    #[must_use]
    pub fn admission(worker: &'static str, message: impl Into<String>) -> Self {
        Self::Admission {
            worker,
            message: message.into(),
        }
    }

    /// Creates a `NotFound` variant.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates an `Internal` variant.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the coordinator may reasonably resubmit or re-poll.
    ///
    /// Unknown identifiers and worker-side failures are not retriable.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Admission { .. } | Self::DeadlineExceeded { .. }
        )
    }
}

/// Convenient result alias for client operations.
pub type CoreResult<T> = Result<T, CoreError>;
