//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job lifecycle (submissions, terminal outcomes, durations)
//! - Delivery (artifacts and bytes served)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Job Metrics
// =============================================================================

/// Jobs submitted total.
pub static JOBS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("tubedrop_jobs_submitted_total", "Total jobs submitted").unwrap()
});

/// Jobs reaching a terminal state, by result.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tubedrop_jobs_finished_total",
            "Total jobs reaching a terminal state",
        ),
        &["result"], // "completed", "failed", "cancelled"
    )
    .unwrap()
});

/// Job duration in seconds, from submission to terminal state.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("tubedrop_job_duration_seconds", "Duration of jobs").buckets(vec![
            1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0,
        ]),
        &["result"],
    )
    .unwrap()
});

/// Jobs currently being supervised.
pub static ACTIVE_JOBS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tubedrop_active_jobs",
        "Number of jobs with a running supervisor task",
    )
    .unwrap()
});

// =============================================================================
// Delivery Metrics
// =============================================================================

/// Artifacts claimed for delivery.
pub static ARTIFACTS_DELIVERED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tubedrop_artifacts_delivered_total",
        "Total artifacts claimed for delivery",
    )
    .unwrap()
});

/// Bytes handed to delivery (artifact size at claim time).
pub static ARTIFACT_BYTES_DELIVERED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tubedrop_artifact_bytes_delivered_total",
        "Total artifact bytes claimed for delivery",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(ACTIVE_JOBS.clone()),
        Box::new(ARTIFACTS_DELIVERED.clone()),
        Box::new(ARTIFACT_BYTES_DELIVERED.clone()),
    ]
}
