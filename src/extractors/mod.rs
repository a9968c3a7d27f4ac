use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::process::Command;

pub mod playlist;
pub mod transcript;

pub use playlist::YtDlpPlaylistResolver;
pub use transcript::{LanguagePolicy, YtDlpTranscriptFetcher};

/// Playlist title used when the provider does not report one
pub const DEFAULT_PLAYLIST_TITLE: &str = "YouTube Playlist";

/// Lightweight description of a playlist entry, as returned by flat extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDescriptor {
    /// Provider-assigned video ID
    pub id: String,

    /// Human-readable title (may contain characters unsafe for filenames)
    pub title: String,
}

/// A resolved playlist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub title: String,
    pub videos: Vec<VideoDescriptor>,
}

/// Individual transcript segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Segment text
    pub text: String,

    /// Start time in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

#[derive(thiserror::Error, Debug)]
pub enum ResolutionError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Provider(String),

    #[error("Could not parse playlist information: {0}")]
    Parse(String),

    #[error("URL does not point to a playlist: {0}")]
    NotAPlaylist(String),

    #[error("Playlist contains no videos: {0}")]
    EmptyPlaylist(String),
}

/// Reasons a single video's transcript could not be retrieved.
///
/// The `Display` output is what ends up in the failure report.
#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Provider(String),

    #[error("Subtitles are disabled for this video")]
    Disabled,

    #[error("No transcript found for languages {requested:?} (available: {available:?})")]
    NoMatchingTrack {
        requested: Vec<String>,
        available: Vec<String>,
    },

    #[error("Transcript track '{0}' has no json3 format")]
    UnsupportedFormat(String),

    #[error("Failed to download transcript: {0}")]
    Http(String),

    #[error("Could not parse transcript: {0}")]
    Parse(String),
}

/// Produces the ordered list of videos in a playlist
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaylistResolver: Send + Sync {
    /// Resolve a playlist URL or identifier without inspecting individual videos
    async fn resolve(&self, url: &str) -> Result<Playlist, ResolutionError>;
}

/// Retrieves the transcript of a single video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    /// Fetch the ordered transcript segments of a video. Never retries.
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>, TranscriptError>;
}

/// Raw outcome of a yt-dlp invocation
pub(crate) struct YtDlpOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl YtDlpOutput {
    /// The provider's own diagnostic: its `ERROR:` lines if any, otherwise the whole stderr
    pub fn error_message(&self) -> String {
        let errors: Vec<&str> = self
            .stderr
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("ERROR:"))
            .collect();

        if !errors.is_empty() {
            errors.join("\n")
        } else if !self.stderr.trim().is_empty() {
            self.stderr.trim().to_string()
        } else {
            "yt-dlp exited without output".to_string()
        }
    }
}

/// Run yt-dlp with the given arguments and capture its output
pub(crate) async fn run_yt_dlp(program: &str, args: &[&str]) -> std::io::Result<YtDlpOutput> {
    tracing::debug!("Running {} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    Ok(YtDlpOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(stderr: &str) -> YtDlpOutput {
        YtDlpOutput {
            success: false,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_error_message_prefers_error_lines() {
        let out = output(
            "WARNING: [youtube] falling back\nERROR: [youtube] abc: Private video\n",
        );
        assert_eq!(out.error_message(), "ERROR: [youtube] abc: Private video");
    }

    #[test]
    fn test_error_message_falls_back_to_stderr() {
        assert_eq!(output("  something broke \n").error_message(), "something broke");
        assert_eq!(output("").error_message(), "yt-dlp exited without output");
    }

    #[test]
    fn test_transcript_error_display_is_verbatim_for_provider_errors() {
        let err = TranscriptError::Provider("ERROR: Video unavailable".to_string());
        assert_eq!(err.to_string(), "ERROR: Video unavailable");
    }
}
