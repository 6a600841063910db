//! Download orchestrator implementation.
//!
//! The orchestrator is the facade the transport layer talks to: it
//! validates a request, allocates the job id and output path, registers the
//! job, spawns the supervisor task, and returns the id without waiting for
//! any work to happen. Everything asynchronous after that point is surfaced
//! only through the registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::fetcher::{FetchError, FetchEvent, FetchJob, SourceFetcher};
use crate::job::{Job, JobError, JobRegistry};
use crate::metrics;
use crate::progress::clamp_percent;

use super::types::{DownloadRequest, OrchestratorError, OrchestratorStatus};
use crate::config::DownloadsConfig;

/// Buffer size for the per-job event channel.
const EVENT_BUFFER_SIZE: usize = 64;

/// Drives download jobs from submission to their terminal state.
pub struct DownloadOrchestrator {
    config: DownloadsConfig,
    registry: Arc<JobRegistry>,
    fetcher: Arc<dyn SourceFetcher>,
    /// Cancel senders for jobs whose supervisor task is still running.
    active: Arc<RwLock<HashMap<String, broadcast::Sender<()>>>>,
}

impl DownloadOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(
        config: DownloadsConfig,
        registry: Arc<JobRegistry>,
        fetcher: Arc<dyn SourceFetcher>,
    ) -> Self {
        Self {
            config,
            registry,
            fetcher,
            active: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Validates and registers a new job, spawns its supervisor, and
    /// returns the fresh job id immediately.
    ///
    /// Any failure after this returns (spawn failure included) is recorded
    /// on the job and observable only via the registry.
    pub async fn submit(&self, request: DownloadRequest) -> Result<String, OrchestratorError> {
        Self::validate_request(&request)?;

        let id = Uuid::new_v4().to_string();
        let output_path = self
            .config
            .dir
            .join(format!("{}.{}", id, request.format.extension()));

        let job = Job::new(&id, &request.url, request.format, output_path.clone());
        self.registry.insert(job).await?;

        let (cancel_tx, cancel_rx) = broadcast::channel(1);
        self.active.write().await.insert(id.clone(), cancel_tx);

        info!("[{}] starting download ({}) for: {}", id, request.format.extension(), request.url);
        metrics::JOBS_SUBMITTED.inc();
        metrics::ACTIVE_JOBS.inc();

        let registry = Arc::clone(&self.registry);
        let fetcher = Arc::clone(&self.fetcher);
        let active = Arc::clone(&self.active);
        let fetch_job = FetchJob {
            job_id: id.clone(),
            source_url: request.url,
            format: request.format,
            output_path,
        };

        tokio::spawn(async move {
            Self::run_job(registry, fetcher, active, fetch_job, cancel_rx).await;
        });

        Ok(id)
    }

    fn validate_request(request: &DownloadRequest) -> Result<(), OrchestratorError> {
        let url = request.url.trim();
        if url.is_empty() {
            return Err(OrchestratorError::InvalidRequest(
                "url must not be empty".to_string(),
            ));
        }
        if !url.contains("://") {
            return Err(OrchestratorError::InvalidRequest(format!(
                "url has no scheme: {}",
                url
            )));
        }
        Ok(())
    }

    /// Runs one job to its terminal state, keeping the registry current.
    async fn run_job(
        registry: Arc<JobRegistry>,
        fetcher: Arc<dyn SourceFetcher>,
        active: Arc<RwLock<HashMap<String, broadcast::Sender<()>>>>,
        job: FetchJob,
        cancel_rx: broadcast::Receiver<()>,
    ) {
        let job_id = job.job_id.clone();
        let started = Instant::now();

        let (events_tx, mut events_rx) = mpsc::channel(EVENT_BUFFER_SIZE);

        // A single consumer applies events to the registry, so writes for
        // this job are serialized and drained before the terminal
        // transition below.
        let consumer_registry = Arc::clone(&registry);
        let consumer_id = job_id.clone();
        let consumer = tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                let result = match event {
                    FetchEvent::Started => consumer_registry.mark_running(&consumer_id).await,
                    FetchEvent::Progress(pct) => {
                        consumer_registry
                            .record_progress(&consumer_id, clamp_percent(pct))
                            .await
                    }
                };
                if let Err(e) = result {
                    warn!("[{}] progress update dropped: {}", consumer_id, e);
                }
            }
        });

        let result = fetcher.fetch(&job, events_tx, cancel_rx).await;
        // The events sender is gone once fetch returns; wait for the
        // consumer to finish applying what was in flight.
        let _ = consumer.await;

        let outcome = match result {
            Ok(()) => {
                match registry.complete(&job_id).await {
                    Ok(()) => info!("[{}] download complete", job_id),
                    Err(e) => warn!("[{}] completion not recorded: {}", job_id, e),
                }
                "completed"
            }
            Err(FetchError::Cancelled) => {
                info!("[{}] download cancelled", job_id);
                if let Err(e) = registry.fail(&job_id, FetchError::Cancelled.failure_reason()).await
                {
                    warn!("[{}] cancellation not recorded: {}", job_id, e);
                }
                "cancelled"
            }
            Err(e) => {
                warn!("[{}] download failed: {}", job_id, e);
                if let Err(err) = registry.fail(&job_id, e.failure_reason()).await {
                    warn!("[{}] failure not recorded: {}", job_id, err);
                }
                "failed"
            }
        };

        metrics::JOBS_FINISHED.with_label_values(&[outcome]).inc();
        metrics::JOB_DURATION
            .with_label_values(&[outcome])
            .observe(started.elapsed().as_secs_f64());
        metrics::ACTIVE_JOBS.dec();

        active.write().await.remove(&job_id);
    }

    /// Signals the job's supervisor to terminate the external process.
    ///
    /// The job transitions to `Failed` with reason `Cancelled` once the
    /// supervisor has reaped the process; this call only raises the signal.
    pub async fn cancel(&self, id: &str) -> Result<(), OrchestratorError> {
        let job = self
            .registry
            .get(id)
            .await
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;

        if job.state.is_terminal() {
            return Err(JobError::Terminal {
                job_id: id.to_string(),
                state: job.state.state_type().to_string(),
            }
            .into());
        }

        if let Some(tx) = self.active.read().await.get(id) {
            let _ = tx.send(());
        }
        Ok(())
    }

    /// Cancels all active jobs; used for graceful shutdown.
    pub async fn stop(&self) {
        let active = self.active.read().await;
        if active.is_empty() {
            return;
        }
        info!("Cancelling {} active jobs", active.len());
        for tx in active.values() {
            let _ = tx.send(());
        }
    }

    /// Current orchestrator activity.
    pub async fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            active_jobs: self.active.read().await.len(),
            tracked_jobs: self.registry.len().await,
        }
    }

    /// The registry this orchestrator writes to.
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }
}
