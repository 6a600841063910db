//! Error types for the fetcher module.

use std::path::PathBuf;
use thiserror::Error;

use crate::job::FailureReason;

/// Errors that can occur while running the external fetch tool.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Fetch tool binary not found.
    #[error("fetch tool not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// The tool could not be started for a reason other than a missing binary.
    #[error("failed to start fetch tool: {detail}")]
    SpawnFailure { detail: String },

    /// The tool started but exited non-zero.
    #[error("fetch tool exited with code {exit_code:?}")]
    ProcessFailure {
        exit_code: Option<i32>,
        stderr: Option<String>,
    },

    /// The tool reported success but wrote nothing at the output path.
    #[error("no output artifact at {path}")]
    NoOutput { path: PathBuf },

    /// The tool ran past the configured deadline.
    #[error("fetch timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The fetch was cancelled and the tool killed.
    #[error("fetch cancelled")]
    Cancelled,

    /// I/O error while reading tool output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Maps this error to the reason recorded on the failed job.
    pub fn failure_reason(&self) -> FailureReason {
        match self {
            FetchError::ToolNotFound { path } => FailureReason::Spawn {
                detail: format!("tool not found at {}", path.display()),
            },
            FetchError::SpawnFailure { detail } => FailureReason::Spawn {
                detail: detail.clone(),
            },
            FetchError::ProcessFailure { exit_code, stderr } => FailureReason::Process {
                exit_code: *exit_code,
                detail: stderr.clone(),
            },
            FetchError::NoOutput { .. } => FailureReason::NoOutput,
            FetchError::Timeout { timeout_secs } => FailureReason::Timeout {
                timeout_secs: *timeout_secs,
            },
            FetchError::Cancelled => FailureReason::Cancelled,
            FetchError::Io(e) => FailureReason::Process {
                exit_code: None,
                detail: Some(e.to_string()),
            },
        }
    }
}
