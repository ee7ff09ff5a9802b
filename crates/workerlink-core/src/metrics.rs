//! Prometheus metrics for worker client calls.
//!
//! Metrics are registered lazily on first access using once_cell::Lazy.

use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, IntCounterVec};

/// Total client calls by client, operation and outcome
pub static CLIENT_CALLS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "workerlink_client_calls_total",
        "Total number of worker client calls",
        &["client", "operation", "status"]
    )
    .expect("Failed to register client call counter")
});

/// Jobs accepted by a worker, by kind (flush, build_index, load_index)
pub static JOBS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "workerlink_jobs_submitted_total",
        "Total number of jobs submitted to workers",
        &["kind"]
    )
    .expect("Failed to register job submission counter")
});

pub fn record_call(client: &str, operation: &str, success: bool) {
    let status = if success { "ok" } else { "error" };
    CLIENT_CALLS
        .with_label_values(&[client, operation, status])
        .inc();
}

pub fn record_submission(kind: &str) {
    JOBS_SUBMITTED.with_label_values(&[kind]).inc();
}
