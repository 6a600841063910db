//! Job model and registry.
//!
//! A [`Job`] tracks one download-and-transcode request from creation to its
//! terminal state. The [`JobRegistry`] is the shared, in-memory source of
//! truth, read by the progress-polling path and written by the supervisor
//! task that owns the job.

mod error;
mod registry;
mod types;

pub use error::JobError;
pub use registry::JobRegistry;
pub use types::{FailureReason, Job, JobState, OutputFormat, UnknownFormatError};
