use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

use crate::archive::ArchiveBuilder;
use crate::batch::{BatchProcessor, BatchRun, ProgressSink};
use crate::config::Config;
use crate::extractors::{
    PlaylistResolver, TranscriptFetcher, YtDlpPlaylistResolver, YtDlpTranscriptFetcher,
};
use crate::utils::sanitize_filename;
use crate::PlaylistTranscriptsError;

/// Outcome of a complete playlist run
#[derive(Debug)]
pub struct PipelineReport {
    /// Playlist URL as handed to the resolver
    pub url: String,

    pub playlist_title: String,

    pub run: BatchRun,

    /// Where the archive was saved; `None` when no transcript could be retrieved
    pub archive_path: Option<PathBuf>,

    pub elapsed: Duration,
}

/// Resolves a playlist, fetches every transcript and writes the archive
pub struct PlaylistPipeline {
    resolver: Box<dyn PlaylistResolver>,
    fetcher: Box<dyn TranscriptFetcher>,
    output_dir: PathBuf,
    item_delay: Duration,
    cancel: CancellationToken,
}

impl PlaylistPipeline {
    pub fn new(resolver: Box<dyn PlaylistResolver>, fetcher: Box<dyn TranscriptFetcher>) -> Self {
        Self {
            resolver,
            fetcher,
            output_dir: PathBuf::from("."),
            item_delay: Duration::ZERO,
            cancel: CancellationToken::new(),
        }
    }

    /// Create a pipeline backed by yt-dlp
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let resolver = YtDlpPlaylistResolver::new(config.provider.yt_dlp_path.clone());
        let fetcher = YtDlpTranscriptFetcher::new(
            config.provider.yt_dlp_path.clone(),
            config.language_policy(),
            config.http_timeout(),
        )?;

        let output_dir = match &config.app.output_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        Ok(Self::new(Box::new(resolver), Box::new(fetcher))
            .with_output_dir(output_dir)
            .with_item_delay(config.item_delay()))
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = delay;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Default archive location for a playlist title
    pub fn default_archive_path(&self, playlist_title: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_transcripts.zip", sanitize_filename(playlist_title)))
    }

    /// Run the whole job for one playlist.
    ///
    /// The archive is built in a temporary file next to its destination and only
    /// moved into place when at least one transcript was retrieved.
    pub async fn run(
        &self,
        url: &str,
        output: Option<&Path>,
        sink: &mut dyn ProgressSink,
    ) -> Result<PipelineReport, PlaylistTranscriptsError> {
        let started = Instant::now();

        let playlist = self.resolver.resolve(url).await?;
        sink.on_playlist_resolved(&playlist);

        let archive_path = match output {
            Some(path) => path.to_path_buf(),
            None => self.default_archive_path(&playlist.title),
        };
        let archive_dir = match archive_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs_err::create_dir_all(&archive_dir)?;

        let mut archive = ArchiveBuilder::new(NamedTempFile::new_in(&archive_dir)?);

        let run = BatchProcessor::new(self.fetcher.as_ref())
            .with_item_delay(self.item_delay)
            .with_cancellation(self.cancel.clone())
            .process(&playlist.videos, &mut archive, sink)
            .await?;

        let temp_file = archive.into_inner()?;
        let archive_path = if run.result.has_successes() {
            temp_file.persist(&archive_path).map_err(|e| e.error)?;
            tracing::info!("Archive saved to {}", archive_path.display());
            Some(archive_path)
        } else {
            tracing::warn!("No transcripts retrieved, discarding archive");
            None
        };

        Ok(PipelineReport {
            url: url.to_string(),
            playlist_title: playlist.title,
            run,
            archive_path,
            elapsed: started.elapsed(),
        })
    }
}
