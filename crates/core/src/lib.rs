pub mod config;
pub mod delivery;
pub mod fetcher;
pub mod job;
pub mod metrics;
pub mod orchestrator;
pub mod progress;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DownloadsConfig,
    ServerConfig,
};
pub use delivery::{Artifact, ArtifactStream, DeliveryError, FileDelivery};
pub use fetcher::{FetchError, FetchEvent, FetchJob, FetcherConfig, SourceFetcher, YtDlpFetcher};
pub use job::{FailureReason, Job, JobError, JobRegistry, JobState, OutputFormat};
pub use orchestrator::{
    DownloadOrchestrator, DownloadRequest, OrchestratorError, OrchestratorStatus,
};
pub use progress::{clamp_percent, parse_progress};
