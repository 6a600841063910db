//! Fetcher module: supervision of the external fetch-and-transcode tool.
//!
//! This module provides the [`SourceFetcher`] trait and the yt-dlp backed
//! implementation. A fetcher owns the external process for one job: it
//! builds the argument list from format and source policy, launches the
//! tool, reads its output streams incrementally, pushes parsed progress as
//! [`FetchEvent`]s, and maps termination to a [`FetchError`] or success.

mod config;
mod error;
mod traits;
mod types;
mod ytdlp;

pub use config::FetcherConfig;
pub use error::FetchError;
pub use traits::SourceFetcher;
pub use types::{FetchEvent, FetchJob};
pub use ytdlp::YtDlpFetcher;
