//! Error types for job registry operations.

use thiserror::Error;

/// Errors returned by the job registry.
#[derive(Debug, Error)]
pub enum JobError {
    /// No job with this id is registered.
    #[error("job not found: {0}")]
    NotFound(String),

    /// A job with this id is already registered.
    #[error("job already registered: {0}")]
    Duplicate(String),

    /// The job is already in a terminal state.
    #[error("job {job_id} is already terminal: {state}")]
    Terminal { job_id: String, state: String },

    /// The job exists but is not in the state the operation requires.
    #[error("job {job_id} is not ready: state is {state}")]
    NotReady { job_id: String, state: String },
}
