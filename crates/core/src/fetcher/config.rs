//! Configuration for the fetcher module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the yt-dlp based fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_yt_dlp_path")]
    pub yt_dlp_path: PathBuf,

    /// Path to the ffmpeg binary handed to the tool via `--ffmpeg-location`.
    /// When unset the tool resolves ffmpeg from `PATH` itself.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Quality ceiling for video downloads on platforms that offer
    /// resolution selection (height in pixels).
    #[serde(default = "default_max_video_height")]
    pub max_video_height: u32,

    /// Audio quality passed to the extractor for mp3 output (bitrate in
    /// kbit/s or a VBR level understood by the tool).
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,

    /// Timeout for a single fetch in seconds; the process is killed on expiry.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Additional arguments appended to every invocation.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_yt_dlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_max_video_height() -> u32 {
    720
}

fn default_audio_quality() -> String {
    "192K".to_string()
}

fn default_timeout() -> u64 {
    3600 // 1 hour
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: default_yt_dlp_path(),
            ffmpeg_path: None,
            max_video_height: default_max_video_height(),
            audio_quality: default_audio_quality(),
            timeout_secs: default_timeout(),
            extra_args: Vec::new(),
        }
    }
}

impl FetcherConfig {
    /// Creates a config with a custom yt-dlp path.
    pub fn with_tool_path(yt_dlp_path: PathBuf) -> Self {
        Self {
            yt_dlp_path,
            ..Default::default()
        }
    }

    /// Sets the ffmpeg location.
    pub fn with_ffmpeg_path(mut self, ffmpeg_path: PathBuf) -> Self {
        self.ffmpeg_path = Some(ffmpeg_path);
        self
    }

    /// Sets the video quality ceiling.
    pub fn with_max_video_height(mut self, height: u32) -> Self {
        self.max_video_height = height;
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
