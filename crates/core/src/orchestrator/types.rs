//! Types for the orchestrator module.

use serde::Serialize;
use thiserror::Error;

use crate::job::{JobError, OutputFormat};

/// Request to start a new download job.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Source locator for the external tool.
    pub url: String,
    /// Requested output format.
    pub format: OutputFormat,
}

/// Errors returned by the orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The request was rejected synchronously; no job was created.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A registry operation failed.
    #[error(transparent)]
    Job(#[from] JobError),
}

/// Snapshot of orchestrator activity.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorStatus {
    /// Jobs with a live supervisor task.
    pub active_jobs: usize,
    /// Jobs currently tracked by the registry, in any state.
    pub tracked_jobs: usize,
}
