//! yt-dlp based fetcher implementation.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::job::OutputFormat;
use crate::progress::parse_progress;

use super::config::FetcherConfig;
use super::error::FetchError;
use super::traits::SourceFetcher;
use super::types::{FetchEvent, FetchJob};

/// Lines of stderr kept for the failure reason when the tool exits non-zero.
const STDERR_TAIL_LINES: usize = 8;

/// Fetcher that shells out to yt-dlp.
///
/// The tool is spawned once per job, its stdout and stderr are read
/// incrementally, and every line is fed through the progress parser.
pub struct YtDlpFetcher {
    config: FetcherConfig,
}

impl YtDlpFetcher {
    /// Creates a new fetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Self {
        Self { config }
    }

    /// Creates a fetcher with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(FetcherConfig::default())
    }

    fn is_youtube(url: &str) -> bool {
        url.contains("youtube.com") || url.contains("youtu.be")
    }

    /// Builds the tool argument list for a job.
    ///
    /// mp3 extracts the best audio stream and transcodes it; mp4 selects a
    /// combined video+audio stream, capped at the configured height on
    /// platforms that expose resolution variants, and merges into an mp4
    /// container.
    fn build_args(&self, job: &FetchJob) -> Vec<String> {
        let mut args = vec![job.source_url.clone()];

        match job.format {
            OutputFormat::Mp3 => {
                args.extend([
                    "--extract-audio".to_string(),
                    "--audio-format".to_string(),
                    "mp3".to_string(),
                    "--audio-quality".to_string(),
                    self.config.audio_quality.clone(),
                ]);
            }
            OutputFormat::Mp4 => {
                let selector = if Self::is_youtube(&job.source_url) {
                    format!(
                        "bestvideo[height<={h}]+bestaudio/best[height<={h}]",
                        h = self.config.max_video_height
                    )
                } else {
                    // Other platforms rarely offer height variants worth filtering.
                    "bestvideo+bestaudio/best".to_string()
                };
                args.extend([
                    "-f".to_string(),
                    selector,
                    "--merge-output-format".to_string(),
                    "mp4".to_string(),
                ]);
            }
        }

        if let Some(ref ffmpeg) = self.config.ffmpeg_path {
            args.extend([
                "--ffmpeg-location".to_string(),
                ffmpeg.to_string_lossy().to_string(),
            ]);
        }

        // Line-buffered progress so updates arrive as they happen.
        args.push("--newline".to_string());

        args.extend(self.config.extra_args.iter().cloned());

        args.extend([
            "-o".to_string(),
            job.output_path.to_string_lossy().to_string(),
        ]);

        args
    }
}

#[async_trait]
impl SourceFetcher for YtDlpFetcher {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch(
        &self,
        job: &FetchJob,
        events: mpsc::Sender<FetchEvent>,
        mut cancel: broadcast::Receiver<()>,
    ) -> Result<(), FetchError> {
        let args = self.build_args(job);
        debug!("[{}] invoking {:?} with {:?}", job.job_id, self.config.yt_dlp_path, args);

        let mut child = Command::new(&self.config.yt_dlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FetchError::ToolNotFound {
                        path: self.config.yt_dlp_path.clone(),
                    }
                } else {
                    FetchError::SpawnFailure {
                        detail: e.to_string(),
                    }
                }
            })?;

        let _ = events.send(FetchEvent::Started).await;

        let stdout = child.stdout.take().expect("stdout should be captured");
        let stderr = child.stderr.take().expect("stderr should be captured");
        let mut stdout_lines = BufReader::new(stdout).lines();
        let mut stderr_lines = BufReader::new(stderr).lines();

        // Progress arrives on stdout; errors (and some progress, for
        // postprocessing steps) on stderr. Both are drained concurrently.
        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut stderr_tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
            let mut stdout_done = false;
            let mut stderr_done = false;

            loop {
                if stdout_done && stderr_done {
                    break;
                }
                tokio::select! {
                    line = stdout_lines.next_line(), if !stdout_done => match line {
                        Ok(Some(line)) => {
                            if let Some(pct) = parse_progress(&line) {
                                // Dropping an update under backpressure is
                                // fine, the next one supersedes it.
                                let _ = events.try_send(FetchEvent::Progress(pct));
                            }
                        }
                        Ok(None) => stdout_done = true,
                        Err(e) => return Err(FetchError::Io(e)),
                    },
                    line = stderr_lines.next_line(), if !stderr_done => match line {
                        Ok(Some(line)) => {
                            if let Some(pct) = parse_progress(&line) {
                                let _ = events.try_send(FetchEvent::Progress(pct));
                            }
                            if stderr_tail.len() == STDERR_TAIL_LINES {
                                stderr_tail.pop_front();
                            }
                            stderr_tail.push_back(line);
                        }
                        Ok(None) => stderr_done = true,
                        Err(e) => return Err(FetchError::Io(e)),
                    },
                    _ = cancel.recv() => {
                        let _ = child.kill().await;
                        return Err(FetchError::Cancelled);
                    }
                }
            }

            let status = child.wait().await?;
            Ok((status, stderr_tail))
        })
        .await;

        let (status, stderr_tail) = match result {
            Ok(Ok(ok)) => ok,
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                let _ = child.kill().await;
                return Err(FetchError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        };

        if !status.success() {
            let stderr = if stderr_tail.is_empty() {
                None
            } else {
                Some(stderr_tail.into_iter().collect::<Vec<_>>().join("\n"))
            };
            return Err(FetchError::ProcessFailure {
                exit_code: status.code(),
                stderr,
            });
        }

        // The tool reported success; the artifact must exist where we told
        // it to write.
        tokio::fs::metadata(&job.output_path)
            .await
            .map_err(|_| FetchError::NoOutput {
                path: job.output_path.clone(),
            })?;

        Ok(())
    }

    async fn validate(&self) -> Result<(), FetchError> {
        let result = Command::new(&self.config.yt_dlp_path)
            .arg("--version")
            .output()
            .await;

        match result {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::ToolNotFound {
                path: self.config.yt_dlp_path.clone(),
            }),
            Err(e) => Err(FetchError::SpawnFailure {
                detail: e.to_string(),
            }),
            Ok(output) if !output.status.success() => Err(FetchError::ProcessFailure {
                exit_code: output.status.code(),
                stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
            }),
            Ok(_) => Ok(()),
        }
    }
}
