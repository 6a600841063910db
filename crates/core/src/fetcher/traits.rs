//! Trait definitions for the fetcher module.

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use super::error::FetchError;
use super::types::{FetchEvent, FetchJob};

/// A fetcher that runs one external fetch-and-transcode job to completion.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Runs one job, pushing [`FetchEvent`]s as the external process
    /// produces output.
    ///
    /// `Started` is emitted once, after the process has been launched; if
    /// the events receiver is dropped the fetch continues without progress
    /// reporting. A message on `cancel` terminates the external process and
    /// the fetch returns [`FetchError::Cancelled`]. On `Ok(())` the artifact
    /// exists at the job's output path.
    async fn fetch(
        &self,
        job: &FetchJob,
        events: mpsc::Sender<FetchEvent>,
        cancel: broadcast::Receiver<()>,
    ) -> Result<(), FetchError>;

    /// Validates that the fetcher is properly configured and ready.
    async fn validate(&self) -> Result<(), FetchError>;
}
