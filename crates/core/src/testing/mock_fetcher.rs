//! Mock fetcher for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, RwLock};

use crate::fetcher::{FetchError, FetchEvent, FetchJob, SourceFetcher};

/// Scripted behavior for one fetch call.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Emit the given progress values, write `payload` to the output path,
    /// and succeed.
    Succeed { progress: Vec<f32>, payload: Vec<u8> },
    /// Emit the given progress values, then fail with the given exit code.
    FailProcess { progress: Vec<f32>, exit_code: i32 },
    /// Fail before the process ever starts (no `Started` event).
    FailSpawn,
    /// Report started, then wait until cancelled.
    HangUntilCancelled,
}

/// Mock implementation of the SourceFetcher trait.
///
/// Provides controllable behavior for testing:
/// - Track fetch jobs for assertions
/// - Script success/failure/hang per call, with per-url overrides
/// - Pace progress events to make intermediate states observable
///
/// # Example
///
/// ```rust,ignore
/// use tubedrop_core::testing::{MockBehavior, MockFetcher};
///
/// let fetcher = MockFetcher::new(MockBehavior::Succeed {
///     progress: vec![10.0, 55.0, 100.0],
///     payload: b"encoded audio".to_vec(),
/// });
///
/// // Jobs whose url contains "broken" fail instead
/// fetcher.set_behavior_for("broken", MockBehavior::FailProcess {
///     progress: vec![],
///     exit_code: 1,
/// });
/// ```
#[derive(Debug)]
pub struct MockFetcher {
    /// Default behavior for fetch calls.
    behavior: Arc<RwLock<MockBehavior>>,
    /// Overrides applied when the source url contains the key.
    overrides: Arc<RwLock<Vec<(String, MockBehavior)>>>,
    /// Delay between progress events in milliseconds.
    delay_ms: Arc<RwLock<u64>>,
    /// Recorded fetch jobs.
    calls: Arc<RwLock<Vec<FetchJob>>>,
}

impl MockFetcher {
    /// Create a mock fetcher with the given default behavior.
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior: Arc::new(RwLock::new(behavior)),
            overrides: Arc::new(RwLock::new(Vec::new())),
            delay_ms: Arc::new(RwLock::new(0)),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Replace the default behavior.
    pub async fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.write().await = behavior;
    }

    /// Use `behavior` for jobs whose source url contains `url_fragment`.
    pub async fn set_behavior_for(&self, url_fragment: impl Into<String>, behavior: MockBehavior) {
        self.overrides
            .write()
            .await
            .push((url_fragment.into(), behavior));
    }

    /// Set the pause between progress events.
    pub async fn set_step_delay(&self, delay: Duration) {
        *self.delay_ms.write().await = delay.as_millis() as u64;
    }

    /// All jobs this fetcher was asked to run.
    pub async fn recorded_jobs(&self) -> Vec<FetchJob> {
        self.calls.read().await.clone()
    }

    /// Number of fetch calls made.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    async fn behavior_for(&self, url: &str) -> MockBehavior {
        for (fragment, behavior) in self.overrides.read().await.iter() {
            if url.contains(fragment.as_str()) {
                return behavior.clone();
            }
        }
        self.behavior.read().await.clone()
    }
}

#[async_trait]
impl SourceFetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(
        &self,
        job: &FetchJob,
        events: mpsc::Sender<FetchEvent>,
        mut cancel: broadcast::Receiver<()>,
    ) -> Result<(), FetchError> {
        self.calls.write().await.push(job.clone());

        let behavior = self.behavior_for(&job.source_url).await;
        let delay_ms = *self.delay_ms.read().await;

        match behavior {
            MockBehavior::Succeed { progress, payload } => {
                let _ = events.send(FetchEvent::Started).await;
                for pct in progress {
                    if delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                    let _ = events.send(FetchEvent::Progress(pct)).await;
                }
                tokio::fs::write(&job.output_path, &payload).await?;
                Ok(())
            }
            MockBehavior::FailProcess { progress, exit_code } => {
                let _ = events.send(FetchEvent::Started).await;
                for pct in progress {
                    if delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                    let _ = events.send(FetchEvent::Progress(pct)).await;
                }
                Err(FetchError::ProcessFailure {
                    exit_code: Some(exit_code),
                    stderr: Some("mock process failure".to_string()),
                })
            }
            MockBehavior::FailSpawn => Err(FetchError::SpawnFailure {
                detail: "mock spawn failure".to_string(),
            }),
            MockBehavior::HangUntilCancelled => {
                let _ = events.send(FetchEvent::Started).await;
                tokio::select! {
                    _ = cancel.recv() => Err(FetchError::Cancelled),
                    // Safety valve so a forgotten cancel doesn't wedge a test run.
                    _ = tokio::time::sleep(Duration::from_secs(60)) => {
                        Err(FetchError::Timeout { timeout_secs: 60 })
                    }
                }
            }
        }
    }

    async fn validate(&self) -> Result<(), FetchError> {
        Ok(())
    }
}
