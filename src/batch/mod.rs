use std::io::{Seek, Write};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::archive::{ArchiveBuilder, ArchiveError};
use crate::extractors::{Playlist, TranscriptFetcher, VideoDescriptor};
use crate::utils::transcript_filename;

pub mod outcome;

pub use outcome::{BatchResult, FailedVideo, ProcessingOutcome, ProgressEvent, RECENT_WINDOW};

/// Error message recorded for entries skipped after cancellation
pub const CANCELLED_MESSAGE: &str = "cancelled before processing";

/// Consumer of batch progress. Called synchronously from the processing loop.
pub trait ProgressSink {
    /// The playlist has been resolved and processing is about to start
    fn on_playlist_resolved(&mut self, _playlist: &Playlist) {}

    /// A video is about to be fetched
    fn on_item_started(&mut self, _video: &VideoDescriptor, _index: usize, _total: usize) {}

    /// A video has been processed, successfully or not
    fn on_progress(&mut self, event: &ProgressEvent<'_>);
}

impl<F> ProgressSink for F
where
    F: FnMut(&ProgressEvent<'_>),
{
    fn on_progress(&mut self, event: &ProgressEvent<'_>) {
        self(event)
    }
}

/// Sink that ignores every event
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&mut self, _event: &ProgressEvent<'_>) {}
}

/// Everything a finished run produced besides the archive itself
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub outcomes: Vec<ProcessingOutcome>,
    pub result: BatchResult,
    pub cancelled: bool,
}

/// Fetches every transcript of a playlist, one video at a time
pub struct BatchProcessor<'a> {
    fetcher: &'a dyn TranscriptFetcher,
    item_delay: Duration,
    cancel: CancellationToken,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(fetcher: &'a dyn TranscriptFetcher) -> Self {
        Self {
            fetcher,
            item_delay: Duration::ZERO,
            cancel: CancellationToken::new(),
        }
    }

    /// Pause between two consecutive videos
    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = delay;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Process every video in order, writing successful transcripts into `archive`.
    ///
    /// Per-video failures are recorded as [`ProcessingOutcome::Failure`] and never
    /// stop the loop. Only archive errors are returned. The archive is sealed
    /// before returning.
    pub async fn process<W: Write + Seek>(
        &self,
        videos: &[VideoDescriptor],
        archive: &mut ArchiveBuilder<W>,
        sink: &mut dyn ProgressSink,
    ) -> Result<BatchRun, ArchiveError> {
        let total = videos.len();
        let mut outcomes: Vec<ProcessingOutcome> = Vec::with_capacity(total);
        let mut success_count = 0;
        let mut cancelled = false;

        for (index, video) in videos.iter().enumerate() {
            if !cancelled && self.cancel.is_cancelled() {
                tracing::warn!("Run cancelled, skipping {} remaining videos", total - index);
                cancelled = true;
            }

            let outcome = if cancelled {
                ProcessingOutcome::Failure {
                    video: video.clone(),
                    error: CANCELLED_MESSAGE.to_string(),
                }
            } else {
                sink.on_item_started(video, index, total);
                self.process_one(video, archive).await?
            };

            if outcome.is_success() {
                success_count += 1;
            }
            outcomes.push(outcome);

            sink.on_progress(&ProgressEvent {
                completed: index + 1,
                total,
                success_count,
                outcomes: &outcomes,
            });

            if !cancelled && index + 1 < total {
                self.pause().await;
            }
        }

        archive.seal()?;

        let result = BatchResult::from_outcomes(&outcomes);
        tracing::info!(
            "Processed {} videos: {} succeeded, {} failed",
            result.total,
            result.success_count,
            result.failures.len()
        );

        Ok(BatchRun {
            outcomes,
            result,
            cancelled,
        })
    }

    async fn process_one<W: Write + Seek>(
        &self,
        video: &VideoDescriptor,
        archive: &mut ArchiveBuilder<W>,
    ) -> Result<ProcessingOutcome, ArchiveError> {
        let filename = transcript_filename(video);
        tracing::info!("Processing: {}", video.title);

        match self.fetcher.fetch(&video.id).await {
            Ok(segments) => {
                let transcript = segments
                    .iter()
                    .map(|segment| segment.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");

                archive.add(&filename, transcript.as_bytes())?;

                Ok(ProcessingOutcome::Success {
                    video: video.clone(),
                    filename,
                    transcript,
                })
            }
            Err(e) => {
                tracing::warn!("No transcript for {} ({}): {}", video.title, video.id, e);
                Ok(ProcessingOutcome::Failure {
                    video: video.clone(),
                    error: e.to_string(),
                })
            }
        }
    }

    async fn pause(&self) {
        if self.item_delay.is_zero() {
            return;
        }

        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::sleep(self.item_delay) => {}
        }
    }
}
