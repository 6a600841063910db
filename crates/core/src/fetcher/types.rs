//! Types for the fetcher module.

use std::path::PathBuf;

use crate::job::OutputFormat;

/// A fetch-and-transcode job handed to a [`SourceFetcher`].
///
/// [`SourceFetcher`]: super::SourceFetcher
#[derive(Debug, Clone)]
pub struct FetchJob {
    /// Job id, used for logging and event attribution.
    pub job_id: String,
    /// Source locator passed to the external tool.
    pub source_url: String,
    /// Requested output format.
    pub format: OutputFormat,
    /// Where the tool is instructed to write the artifact.
    pub output_path: PathBuf,
}

/// Event emitted by a fetcher while a job runs.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    /// The external process has been launched.
    Started,
    /// A progress percentage parsed from tool output, unclamped.
    Progress(f32),
}
