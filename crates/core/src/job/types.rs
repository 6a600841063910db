//! Core job data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Requested output format for a download job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Audio-only extraction, transcoded to MPEG Audio Layer III.
    Mp3,
    /// Combined audio/video in an MPEG-4 container.
    Mp4,
}

impl OutputFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Mp4 => "mp4",
        }
    }

    /// Returns the MIME type served for artifacts of this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Mp4 => "video/mp4",
        }
    }
}

/// Error returned when parsing an unrecognized format string.
#[derive(Debug, Error)]
#[error("unsupported format: {0}")]
pub struct UnknownFormatError(pub String);

impl std::str::FromStr for OutputFormat {
    type Err = UnknownFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mp3" => Ok(Self::Mp3),
            "mp4" => Ok(Self::Mp4),
            other => Err(UnknownFormatError(other.to_string())),
        }
    }
}

/// Why a job ended up in `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The external tool could not be started.
    Spawn { detail: String },
    /// The external tool started but exited non-zero.
    Process {
        exit_code: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    /// The tool reported success but no artifact was found at the output path.
    NoOutput,
    /// The tool ran past the configured deadline and was killed.
    Timeout { timeout_secs: u64 },
    /// The job was cancelled before the tool finished.
    Cancelled,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Spawn { detail } => write!(f, "spawn failure: {}", detail),
            FailureReason::Process { exit_code, .. } => {
                write!(f, "process exited with code {:?}", exit_code)
            }
            FailureReason::NoOutput => write!(f, "no output artifact produced"),
            FailureReason::Timeout { timeout_secs } => {
                write!(f, "timed out after {} seconds", timeout_secs)
            }
            FailureReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Current state of a job.
///
/// Transitions are forward-only:
/// ```text
/// Pending -> Running -> Completed
///    |          |
///    v          v
///  Failed    Failed
/// ```
/// `Pending -> Failed` covers spawn failures where the external tool never
/// started. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobState {
    /// Job created, external process not yet launched.
    Pending,
    /// External process is running.
    Running,
    /// Artifact produced and waiting for delivery (terminal).
    Completed,
    /// Job failed (terminal).
    Failed { reason: FailureReason },
}

impl JobState {
    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed { .. })
    }

    /// Returns true if the job failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, JobState::Failed { .. })
    }

    /// Returns the state type as a string (for logs and error messages).
    pub fn state_type(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed { .. } => "failed",
        }
    }
}

/// One download-and-transcode request and its tracked state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier (UUID), assigned at creation.
    pub id: String,

    /// Current state.
    pub state: JobState,

    /// Progress percentage in [0, 100], non-decreasing until terminal.
    pub progress: f32,

    /// Requested output format.
    pub format: OutputFormat,

    /// Source locator handed to the external tool.
    pub source_url: String,

    /// Where the external tool is instructed to write the artifact.
    pub output_path: PathBuf,

    /// When the job was created.
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Creates a new job in `Pending` state with zero progress.
    pub fn new(
        id: impl Into<String>,
        source_url: impl Into<String>,
        format: OutputFormat,
        output_path: PathBuf,
    ) -> Self {
        Self {
            id: id.into(),
            state: JobState::Pending,
            progress: 0.0,
            format,
            source_url: source_url.into(),
            output_path,
            created_at: Utc::now(),
        }
    }
}
