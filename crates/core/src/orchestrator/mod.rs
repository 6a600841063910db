//! Download orchestrator.
//!
//! The orchestrator accepts download requests, allocates jobs, and runs one
//! supervisor task per job:
//! - **Submission**: synchronous validation, then the id is returned
//!   immediately - conversion runs in the background.
//! - **Supervision**: one spawned task per job drives the external tool and
//!   funnels its progress into the job registry through a single-consumer
//!   event channel.
//! - **Cancellation**: a per-job broadcast signal terminates the external
//!   process and fails the job with a `Cancelled` reason.

mod runner;
mod types;

pub use runner::DownloadOrchestrator;
pub use types::{DownloadRequest, OrchestratorError, OrchestratorStatus};
