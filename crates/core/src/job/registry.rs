//! Concurrency-safe, in-memory job registry.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::error::JobError;
use super::types::{FailureReason, Job, JobState};

/// The single source of truth for job state.
///
/// The registry is deliberately volatile: all job state is lost on process
/// restart. Per-job writes come from the one supervisor task that owns the
/// job, so the map-wide lock is only contended by insert/remove and by
/// cross-job reads. The lock is never held across filesystem or process I/O.
///
/// The semantic mutators (`mark_running`, `record_progress`, `complete`,
/// `fail`) enforce the state-machine invariants: transitions are
/// forward-only, progress never decreases, and exactly one terminal
/// transition occurs per job.
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, Job>>,
}

impl JobRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a new job. The id must not already be in use.
    pub async fn insert(&self, job: Job) -> Result<(), JobError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(JobError::Duplicate(job.id));
        }
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    /// Returns a snapshot of the job, if registered.
    pub async fn get(&self, id: &str) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Number of registered jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Returns true when no jobs are registered.
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Marks a pending job as running.
    ///
    /// Called once the external process has been launched. A job already
    /// past `Pending` is left untouched.
    pub async fn mark_running(&self, id: &str) -> Result<(), JobError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;
        if job.state == JobState::Pending {
            job.state = JobState::Running;
        }
        Ok(())
    }

    /// Commits a progress observation for a job.
    ///
    /// A value lower than the stored one is discarded, keeping observed
    /// progress monotonically non-decreasing (the tool re-emits stale
    /// percentages when it restarts counting for a stream merge). Updates
    /// against a terminal job are dropped silently: late output after the
    /// terminal transition must not be applied.
    pub async fn record_progress(&self, id: &str, percent: f32) -> Result<(), JobError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;
        if job.state.is_terminal() {
            return Ok(());
        }
        if percent > job.progress {
            job.progress = percent;
        }
        Ok(())
    }

    /// Transitions a job to `Completed`, forcing progress to 100.
    pub async fn complete(&self, id: &str) -> Result<(), JobError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;
        if job.state.is_terminal() {
            return Err(JobError::Terminal {
                job_id: id.to_string(),
                state: job.state.state_type().to_string(),
            });
        }
        job.state = JobState::Completed;
        job.progress = 100.0;
        Ok(())
    }

    /// Transitions a job to `Failed`, keeping its last observed progress.
    pub async fn fail(&self, id: &str, reason: FailureReason) -> Result<(), JobError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;
        if job.state.is_terminal() {
            return Err(JobError::Terminal {
                job_id: id.to_string(),
                state: job.state.state_type().to_string(),
            });
        }
        job.state = JobState::Failed { reason };
        Ok(())
    }

    /// Removes and returns a completed job.
    ///
    /// This is the claim point for delivery: under concurrent callers only
    /// one gets the job, every later caller sees `NotFound`.
    pub async fn take_completed(&self, id: &str) -> Result<Job, JobError> {
        let mut jobs = self.jobs.write().await;
        match jobs.get(id).map(|j| j.state.clone()) {
            None => Err(JobError::NotFound(id.to_string())),
            Some(JobState::Completed) => {
                Ok(jobs.remove(id).expect("entry present under write lock"))
            }
            Some(state) => Err(JobError::NotReady {
                job_id: id.to_string(),
                state: state.state_type().to_string(),
            }),
        }
    }

    /// Removes a job regardless of state.
    pub async fn remove(&self, id: &str) -> Option<Job> {
        self.jobs.write().await.remove(id)
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
