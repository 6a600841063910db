//! One-shot delivery of completed artifacts.
//!
//! A completed job's artifact is handed to exactly one requester. The claim
//! removes the registry entry (the irrevocable "consumed" marker) and the
//! returned stream deletes the backing file when it is dropped, whether the
//! transfer ran to completion or the client disconnected halfway.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use thiserror::Error;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::job::{JobError, JobRegistry, JobState};
use crate::metrics;

/// Errors that can occur while claiming an artifact for delivery.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Unknown or already-consumed job id.
    #[error("job not found: {0}")]
    NotFound(String),

    /// The job exists but has not completed.
    #[error("job {job_id} is not ready: state is {state}")]
    NotReady { job_id: String, state: String },

    /// The job completed but its file is gone from disk.
    #[error("artifact missing for job {0}")]
    MissingArtifact(String),

    /// I/O error while opening the artifact.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Deletes the artifact file when dropped.
///
/// The guard travels with the byte stream, so the file is reclaimed at the
/// end of the transfer regardless of how the transfer ended. A deletion
/// failure is logged and otherwise ignored: the client already has its
/// bytes, or never will.
#[derive(Debug)]
struct ArtifactCleanup {
    job_id: String,
    path: PathBuf,
}

impl Drop for ArtifactCleanup {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("[{}] artifact deleted", self.job_id),
            Err(e) => warn!(
                "[{}] failed to delete artifact {:?}: {}",
                self.job_id, self.path, e
            ),
        }
    }
}

/// A claimed artifact, ready to be streamed to exactly one client.
#[derive(Debug)]
pub struct Artifact {
    /// Id of the job that produced the artifact.
    pub job_id: String,
    /// File name suggested to the client.
    pub file_name: String,
    /// MIME type of the artifact.
    pub content_type: &'static str,
    /// Size on disk at claim time.
    pub size_bytes: u64,
    cleanup: ArtifactCleanup,
}

impl Artifact {
    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.cleanup.path
    }

    /// Opens the artifact as a byte stream.
    ///
    /// The backing file is deleted when the returned stream is dropped.
    pub async fn into_stream(self) -> Result<ArtifactStream, DeliveryError> {
        let file = File::open(&self.cleanup.path).await?;
        Ok(ArtifactStream {
            inner: ReaderStream::new(file),
            _cleanup: self.cleanup,
        })
    }
}

/// Byte stream over a claimed artifact; owns the deletion guard.
pub struct ArtifactStream {
    inner: ReaderStream<File>,
    _cleanup: ArtifactCleanup,
}

impl Stream for ArtifactStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

/// Hands completed artifacts to requesting clients, exactly once each.
pub struct FileDelivery {
    registry: Arc<JobRegistry>,
}

impl FileDelivery {
    /// Creates a delivery front-end over the given registry.
    pub fn new(registry: Arc<JobRegistry>) -> Self {
        Self { registry }
    }

    /// Claims the completed job `id` for delivery.
    ///
    /// Precondition checks (job exists, is `Completed`, file is on disk)
    /// have no side effects; the registry removal afterwards is the single
    /// serialization point, so under concurrent requests exactly one caller
    /// gets the artifact and the rest see `NotFound`.
    pub async fn claim(&self, id: &str) -> Result<Artifact, DeliveryError> {
        let job = self
            .registry
            .get(id)
            .await
            .ok_or_else(|| DeliveryError::NotFound(id.to_string()))?;

        if job.state != JobState::Completed {
            return Err(DeliveryError::NotReady {
                job_id: id.to_string(),
                state: job.state.state_type().to_string(),
            });
        }

        let meta = tokio::fs::metadata(&job.output_path)
            .await
            .map_err(|_| DeliveryError::MissingArtifact(id.to_string()))?;

        let job = match self.registry.take_completed(id).await {
            Ok(job) => job,
            // Lost the race to a concurrent claim.
            Err(JobError::NotFound(_)) => return Err(DeliveryError::NotFound(id.to_string())),
            Err(JobError::NotReady { job_id, state }) => {
                return Err(DeliveryError::NotReady { job_id, state })
            }
            Err(e) => {
                return Err(DeliveryError::NotReady {
                    job_id: id.to_string(),
                    state: e.to_string(),
                })
            }
        };

        let file_name = job
            .output_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("{}.{}", job.id, job.format.extension()));

        metrics::ARTIFACTS_DELIVERED.inc();
        metrics::ARTIFACT_BYTES_DELIVERED.inc_by(meta.len());
        debug!("[{}] artifact claimed for delivery ({} bytes)", job.id, meta.len());

        Ok(Artifact {
            job_id: job.id.clone(),
            file_name,
            content_type: job.format.content_type(),
            size_bytes: meta.len(),
            cleanup: ArtifactCleanup {
                job_id: job.id,
                path: job.output_path,
            },
        })
    }
}
