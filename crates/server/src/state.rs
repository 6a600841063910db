use std::sync::Arc;
use tubedrop_core::{Config, DownloadOrchestrator, FileDelivery, JobRegistry};

/// Shared application state
pub struct AppState {
    config: Config,
    registry: Arc<JobRegistry>,
    orchestrator: Arc<DownloadOrchestrator>,
    delivery: Arc<FileDelivery>,
}

impl AppState {
    pub fn new(
        config: Config,
        registry: Arc<JobRegistry>,
        orchestrator: Arc<DownloadOrchestrator>,
        delivery: Arc<FileDelivery>,
    ) -> Self {
        Self {
            config,
            registry,
            orchestrator,
            delivery,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn orchestrator(&self) -> &DownloadOrchestrator {
        &self.orchestrator
    }

    pub fn delivery(&self) -> &FileDelivery {
        &self.delivery
    }
}
